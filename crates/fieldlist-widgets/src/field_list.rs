#![forbid(unsafe_code)]

//! Virtualized field sidebar for log search.
//!
//! [`FieldList`] owns the available field names, the user's
//! [`DisplaySelection`], and the search text. From these it derives a flat
//! list of [`VirtualRow`]s and their [`OffsetTable`], rebuilt only when one of
//! the three inputs changes. Scroll and resize events only re-run the
//! window lookup.
//!
//! # Example
//!
//! ```
//! use fieldlist_widgets::field_list::{FieldList, FieldListConfig};
//! use fieldlist_widgets::render::TextRenderer;
//!
//! let mut list = FieldList::new(FieldListConfig::default());
//! list.set_fields(["timestamp", "message", "host", "level", "trace_id"]);
//! list.on_resize(400);
//! assert_eq!(list.rows().len(), 8);
//!
//! let mut out = TextRenderer::new();
//! list.render(&mut out);
//! assert_eq!(out.lines().len(), 8);
//! ```

use std::env;
use std::fmt;
use std::ops::Range;

use crate::partition::{Partition, partition_fields};
use crate::render::{FieldAction, RowRenderer};
use crate::selection::DisplaySelection;
use crate::stateful::{SelectionStore, StateKey, Stateful};
use crate::virtualized::{
    OffsetTable, PlacedRow, RowHeights, RowKind, ScrollPadding, Section, ViewportWindow,
    VirtualRow, build_rows, place_rows, resolve_window,
};

/// Fields shown when nothing has been stored yet. Never removable.
pub const DEFAULT_FIELDS: [&str; 2] = ["timestamp", "message"];

/// Storage-side fields that never appear in either section.
pub const SYNTHETIC_FIELDS: [&str; 3] = ["_msg", "_time", "*"];

/// Query names for the default fields when added from the displayed section.
pub const QUERY_ALIASES: [(&str, &str); 2] = [("timestamp", "_time"), ("message", "_msg")];

/// Instance id of the persisted selection.
pub const DEFAULT_INSTANCE_ID: &str = "logSearchFields";

/// Rows of buffer mounted beyond each viewport edge.
pub const DEFAULT_BUFFER_ROWS: u32 = 8;

/// Additional overscan rows on top of the buffer.
pub const DEFAULT_OVERSCAN_ROWS: u32 = 3;

/// Callback receiving the query label of a field.
pub type OnAddToQuery = Box<dyn Fn(&str) + Send + Sync>;
/// Callback receiving the new ordered display selection.
pub type OnDisplayChange = Box<dyn Fn(&[String]) + Send + Sync>;

/// Configuration for [`FieldList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldListConfig {
    /// Row height per kind.
    pub heights: RowHeights,
    /// Buffer beyond the viewport, in field-row heights.
    pub buffer_rows: u32,
    /// Overscan beyond the buffer, in field-row heights.
    pub overscan_rows: u32,
    /// Initial selection and the set of pinned fields.
    pub default_fields: Vec<String>,
    /// Fields excluded from both sections.
    pub synthetic_fields: Vec<String>,
    /// `(field, query name)` pairs applied to displayed rows.
    pub query_aliases: Vec<(String, String)>,
    /// Instance id used for the persisted state key.
    pub instance_id: String,
}

impl Default for FieldListConfig {
    fn default() -> Self {
        Self {
            heights: RowHeights::default(),
            buffer_rows: DEFAULT_BUFFER_ROWS,
            overscan_rows: DEFAULT_OVERSCAN_ROWS,
            default_fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            synthetic_fields: SYNTHETIC_FIELDS.iter().map(|f| f.to_string()).collect(),
            query_aliases: QUERY_ALIASES
                .iter()
                .map(|(f, q)| (f.to_string(), q.to_string()))
                .collect(),
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
        }
    }
}

impl FieldListConfig {
    /// Defaults with `FIELDLIST_BUFFER_ROWS` / `FIELDLIST_OVERSCAN_ROWS`
    /// overrides. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = env::var("FIELDLIST_BUFFER_ROWS")
            && let Ok(n) = val.trim().parse()
        {
            config.buffer_rows = n;
        }
        if let Ok(val) = env::var("FIELDLIST_OVERSCAN_ROWS")
            && let Ok(n) = val.trim().parse()
        {
            config.overscan_rows = n;
        }
        config
    }

    #[must_use]
    pub fn with_heights(mut self, heights: RowHeights) -> Self {
        self.heights = heights;
        self
    }

    #[must_use]
    pub fn with_buffer_rows(mut self, rows: u32) -> Self {
        self.buffer_rows = rows;
        self
    }

    #[must_use]
    pub fn with_overscan_rows(mut self, rows: u32) -> Self {
        self.overscan_rows = rows;
        self
    }

    #[must_use]
    pub fn with_default_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    /// Buffer and overscan converted to pixels.
    #[must_use]
    pub fn padding(&self) -> ScrollPadding {
        ScrollPadding::from_rows(self.buffer_rows, self.overscan_rows, self.heights.item)
    }

    /// Whether `field` is a default field (shown without a remove control).
    #[must_use]
    pub fn is_pinned(&self, field: &str) -> bool {
        self.default_fields.iter().any(|f| f == field)
    }

    /// Whether `field` is a storage-side name listed in neither section.
    #[must_use]
    pub fn is_synthetic(&self, field: &str) -> bool {
        self.synthetic_fields.iter().any(|f| f == field)
    }

    /// Query name for `field`, honouring aliases in the displayed section.
    #[must_use]
    pub fn query_label<'a>(&'a self, field: &'a str, section: Section) -> &'a str {
        if section == Section::Hidden {
            return field;
        }
        self.query_aliases
            .iter()
            .find(|(f, _)| f == field)
            .map_or(field, |(_, q)| q.as_str())
    }
}

/// The virtualized field list component.
pub struct FieldList {
    config: FieldListConfig,
    fields: Vec<String>,
    selection: DisplaySelection,
    search: String,
    rows: Vec<VirtualRow>,
    table: OffsetTable,
    viewport: ViewportWindow,
    window: Range<usize>,
    rebuilds: u64,
    store: Option<Box<dyn SelectionStore + Send + Sync>>,
    on_add_to_query: Option<OnAddToQuery>,
    on_display_change: Option<OnDisplayChange>,
}

impl fmt::Debug for FieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldList")
            .field("fields", &self.fields.len())
            .field("selection", &self.selection)
            .field("search", &self.search)
            .field("rows", &self.rows.len())
            .field("viewport", &self.viewport)
            .field("window", &self.window)
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl FieldList {
    /// Create a list with the default selection and no persistence.
    #[must_use]
    pub fn new(config: FieldListConfig) -> Self {
        let selection = DisplaySelection::from_fields(config.default_fields.iter().cloned());
        let mut list = Self {
            config,
            fields: Vec::new(),
            selection,
            search: String::new(),
            rows: Vec::new(),
            table: OffsetTable::default(),
            viewport: ViewportWindow::default(),
            window: 0..0,
            rebuilds: 0,
            store: None,
            on_add_to_query: None,
            on_display_change: None,
        };
        list.rebuild();
        list
    }

    /// Create a list whose selection is restored from and written to `store`.
    ///
    /// A missing entry yields the default selection. A corrupt or
    /// incompatible entry is logged and also yields the default selection.
    #[must_use]
    pub fn with_store<S>(config: FieldListConfig, store: S) -> Self
    where
        S: SelectionStore + Send + Sync + 'static,
    {
        let mut list = Self::new(config);
        match store.load_selection() {
            Ok(Some(stored)) => list.restore_state(stored),
            Ok(None) => {
                tracing::debug!(
                    key = %list.state_key(),
                    "no stored field selection, using defaults"
                );
            }
            Err(err) => {
                tracing::warn!(
                    key = %list.state_key(),
                    error = %err,
                    "stored field selection unusable, falling back to defaults"
                );
            }
        }
        list.store = Some(Box::new(store));
        list
    }

    /// Register the add-to-query sink.
    #[must_use]
    pub fn on_add_to_query(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_add_to_query = Some(Box::new(f));
        self
    }

    /// Register the display-change callback.
    #[must_use]
    pub fn on_display_change(mut self, f: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_display_change = Some(Box::new(f));
        self
    }

    // ── Inputs ──────────────────────────────────────────────────────────

    /// Replace the available field names.
    pub fn set_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields == self.fields {
            return;
        }
        self.fields = fields;
        self.rebuild();
    }

    /// Update the search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search == self.search {
            return;
        }
        self.search = search;
        self.rebuild();
    }

    /// Scroll event: new scroll offset of the container.
    pub fn on_scroll(&mut self, scroll_top: u32) {
        self.viewport.scroll_top = scroll_top;
        self.resolve();
    }

    /// Resize event: new height of the container.
    pub fn on_resize(&mut self, container_height: u32) {
        self.viewport.container_height = container_height;
        self.resolve();
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Add `field` to the end of the display selection.
    ///
    /// Returns `false` when the field is already displayed or is synthetic.
    pub fn add(&mut self, field: &str) -> bool {
        if self.config.is_synthetic(field) {
            tracing::debug!(field, "refusing to display synthetic field");
            return false;
        }
        if !self.selection.add(field) {
            tracing::debug!(field, "field already displayed");
            return false;
        }
        self.selection_changed();
        true
    }

    /// Remove `field` from the display selection.
    ///
    /// Returns `false` for pinned default fields and fields not displayed.
    pub fn remove(&mut self, field: &str) -> bool {
        if self.config.is_pinned(field) {
            tracing::debug!(field, "refusing to remove pinned field");
            return false;
        }
        if !self.selection.remove(field) {
            return false;
        }
        self.selection_changed();
        true
    }

    /// Invoke the add-to-query sink for a field row and return the label sent.
    pub fn add_to_query(&self, field: &str, section: Section) -> String {
        let label = self.config.query_label(field, section).to_string();
        if let Some(sink) = &self.on_add_to_query {
            sink(&label);
        }
        label
    }

    fn selection_changed(&mut self) {
        if let Some(store) = &self.store
            && let Err(err) = store.save_selection(self.selection.as_slice())
        {
            tracing::warn!(error = %err, "failed to persist field selection");
        }
        if let Some(cb) = &self.on_display_change {
            cb(self.selection.as_slice());
        }
        self.rebuild();
    }

    // ── Derivation ──────────────────────────────────────────────────────

    fn rebuild(&mut self) {
        let partition = self.partition();
        self.rows = build_rows(&partition, &self.config.heights);
        self.table = OffsetTable::for_rows(&self.rows);
        self.rebuilds += 1;
        self.resolve();
    }

    fn resolve(&mut self) {
        self.window = resolve_window(&self.table, self.viewport, self.config.padding());
        tracing::trace!(
            scroll_top = self.viewport.scroll_top,
            height = self.viewport.container_height,
            start = self.window.start,
            end = self.window.end,
            "resolved field window"
        );
    }

    /// The filtered displayed/hidden sections for the current inputs.
    #[must_use]
    pub fn partition(&self) -> Partition {
        partition_fields(
            &self.fields,
            &self.selection,
            &self.config.synthetic_fields,
            &self.search,
        )
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &FieldListConfig {
        &self.config
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn selection(&self) -> &DisplaySelection {
        &self.selection
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn rows(&self) -> &[VirtualRow] {
        &self.rows
    }

    #[must_use]
    pub fn offsets(&self) -> &OffsetTable {
        &self.table
    }

    #[must_use]
    pub fn total_height(&self) -> u32 {
        self.table.total_height()
    }

    #[must_use]
    pub fn viewport(&self) -> ViewportWindow {
        self.viewport
    }

    /// Index range of mounted rows.
    #[must_use]
    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    /// How many times rows were derived from inputs.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Mounted rows with their absolute top offsets.
    pub fn visible_rows(&self) -> impl Iterator<Item = PlacedRow<'_>> + '_ {
        place_rows(&self.rows, &self.table, self.window.clone())
    }

    /// Action control for a field row.
    #[must_use]
    pub fn action_for(&self, name: &str, section: Section) -> FieldAction {
        match section {
            Section::Hidden => FieldAction::Add,
            Section::Displayed if self.config.is_pinned(name) => FieldAction::Pinned,
            Section::Displayed => FieldAction::Remove,
        }
    }

    /// Hand mounted rows to `renderer`.
    pub fn render<R: RowRenderer + ?Sized>(&self, renderer: &mut R) {
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "FieldList",
            rows = self.rows.len(),
            start = self.window.start,
            end = self.window.end,
            total_height = self.table.total_height()
        )
        .entered();

        renderer.begin(self.table.total_height());
        if self.rows.is_empty() {
            renderer.empty_state();
            return;
        }
        for placed in self.visible_rows() {
            let height = placed.row.height;
            match &placed.row.kind {
                RowKind::SectionTitle(section) => {
                    renderer.section_title(placed.top, height, *section);
                }
                RowKind::Spacer => renderer.spacer(placed.top, height),
                RowKind::FieldItem { name, section } => {
                    let action = self.action_for(name, *section);
                    renderer.field(placed.top, height, name, *section, action);
                }
            }
        }
    }
}

impl Stateful for FieldList {
    type State = Vec<String>;

    fn state_key(&self) -> StateKey {
        StateKey::new("FieldList", self.config.instance_id.clone())
    }

    fn save_state(&self) -> Vec<String> {
        self.selection.as_slice().to_vec()
    }

    fn restore_state(&mut self, state: Vec<String>) {
        self.selection = DisplaySelection::from(state);
        self.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextRenderer;
    use crate::stateful::MemorySelectionStore;
    use std::sync::{Arc, Mutex};

    const FIELDS: [&str; 5] = ["timestamp", "message", "host", "level", "trace_id"];

    fn list() -> FieldList {
        let mut list = FieldList::new(FieldListConfig::default());
        list.set_fields(FIELDS);
        list.on_resize(400);
        list
    }

    #[test]
    fn default_scenario_has_eight_rows() {
        let list = list();
        let p = list.partition();
        assert_eq!(p.displayed, vec!["timestamp", "message"]);
        assert_eq!(p.hidden, vec!["host", "level", "trace_id"]);
        assert_eq!(list.rows().len(), 8);
        assert_eq!(list.window(), 0..8);
    }

    #[test]
    fn search_ho_leaves_hidden_host() {
        let mut list = list();
        list.set_search("ho");
        let rows = list.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, RowKind::SectionTitle(Section::Hidden));
        assert_eq!(rows[1].field_name(), Some("host"));
    }

    #[test]
    fn add_then_add_again_is_noop() {
        let store = Arc::new(MemorySelectionStore::new());
        let mut list = FieldList::with_store(FieldListConfig::default(), Arc::clone(&store));
        assert!(list.add("host"));
        assert!(!list.add("host"));
        assert_eq!(list.selection().as_slice(), ["timestamp", "message", "host"]);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn remove_then_add_moves_to_end() {
        let store = Arc::new(MemorySelectionStore::with_selection([
            "timestamp",
            "host",
            "message",
        ]));
        let mut list = FieldList::with_store(FieldListConfig::default(), Arc::clone(&store));
        assert!(list.remove("host"));
        assert!(list.add("host"));
        assert_eq!(list.selection().as_slice(), ["timestamp", "message", "host"]);
        assert_eq!(
            store.snapshot(),
            Some(vec!["timestamp".to_string(), "message".into(), "host".into()])
        );
    }

    #[test]
    fn pinned_fields_cannot_be_removed() {
        let mut list = list();
        assert!(!list.remove("timestamp"));
        assert!(!list.remove("not-there"));
        assert_eq!(list.selection().len(), 2);
    }

    #[test]
    fn synthetic_fields_cannot_be_added() {
        let store = Arc::new(MemorySelectionStore::new());
        let changes = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&changes);
        let mut list = FieldList::with_store(FieldListConfig::default(), Arc::clone(&store))
            .on_display_change(move |_| *counter.lock().unwrap() += 1);

        for name in ["_msg", "_time", "*"] {
            assert!(!list.add(name), "{name} was added");
        }
        assert_eq!(list.selection().as_slice(), ["timestamp", "message"]);
        assert_eq!(store.write_count(), 0);
        assert_eq!(*changes.lock().unwrap(), 0);
    }

    #[test]
    fn corrupt_store_falls_back_to_defaults() {
        let list = FieldList::with_store(
            FieldListConfig::default(),
            MemorySelectionStore::corrupt("expected value at line 1 column 1"),
        );
        assert_eq!(list.selection().as_slice(), ["timestamp", "message"]);
    }

    #[test]
    fn stored_selection_is_restored() {
        let list = FieldList::with_store(
            FieldListConfig::default(),
            MemorySelectionStore::with_selection(["level", "level", "host"]),
        );
        assert_eq!(list.selection().as_slice(), ["level", "host"]);
    }

    #[test]
    fn display_change_callback_receives_selection() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut list = FieldList::new(FieldListConfig::default())
            .on_display_change(move |sel| sink.lock().unwrap().push(sel.to_vec()));
        list.add("host");
        list.remove("host");
        list.remove("host");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], vec!["timestamp", "message", "host"]);
        assert_eq!(seen[1], vec!["timestamp", "message"]);
    }

    #[test]
    fn add_to_query_maps_default_fields_in_displayed_section() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        let list = FieldList::new(FieldListConfig::default())
            .on_add_to_query(move |label| sink.lock().unwrap().push(label.to_string()));
        assert_eq!(list.add_to_query("timestamp", Section::Displayed), "_time");
        assert_eq!(list.add_to_query("message", Section::Displayed), "_msg");
        assert_eq!(list.add_to_query("message", Section::Hidden), "message");
        assert_eq!(list.add_to_query("host", Section::Displayed), "host");
        assert_eq!(sent.lock().unwrap().len(), 4);
    }

    #[test]
    fn scroll_does_not_rebuild_rows() {
        let mut list = list();
        let before = list.rebuild_count();
        list.on_scroll(64);
        list.on_scroll(128);
        assert_eq!(list.rebuild_count(), before);
        list.set_search("");
        assert_eq!(list.rebuild_count(), before);
        list.set_search("h");
        assert_eq!(list.rebuild_count(), before + 1);
    }

    #[test]
    fn large_list_mounts_only_window() {
        let mut list = FieldList::new(FieldListConfig::default());
        list.set_fields((0..10_000).map(|i| format!("field_{i:05}")));
        list.on_resize(400);
        list.on_scroll(32 * 5_000);
        let window = list.window();
        assert!(window.len() < 40, "mounted {}", window.len());
        let first = list.visible_rows().next().unwrap();
        assert!(first.top <= 32 * 5_000);
    }

    #[test]
    fn render_marks_actions() {
        let mut list = list();
        list.add("host");
        let mut out = TextRenderer::new();
        list.render(&mut out);
        let text = out.output();
        assert!(text.contains("[ ] timestamp"));
        assert!(text.contains("[x] host"));
        assert!(text.contains("[+] level"));
        assert_eq!(out.total_height(), list.total_height());
    }

    #[test]
    fn render_empty_state() {
        let mut list = list();
        list.set_search("zzz");
        let mut out = TextRenderer::new();
        list.render(&mut out);
        assert_eq!(out.lines(), ["(no fields)"]);
        assert_eq!(out.total_height(), 0);
    }

    #[test]
    fn stateful_round_trip() {
        let mut list = list();
        list.add("level");
        let saved = list.save_state();
        let mut other = FieldList::new(FieldListConfig::default());
        other.restore_state(saved);
        assert_eq!(other.selection(), list.selection());
        assert_eq!(other.state_key().canonical(), "FieldList::logSearchFields");
    }

    #[test]
    fn config_padding_in_pixels() {
        let config = FieldListConfig::default();
        assert_eq!(config.padding(), ScrollPadding::new(256, 96));
        let config = config.with_buffer_rows(2).with_overscan_rows(1);
        assert_eq!(config.padding().total(), 96);
    }
}
