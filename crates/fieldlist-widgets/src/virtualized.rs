#![forbid(unsafe_code)]

//! Virtualization primitives for the field list.
//!
//! Only the rows intersecting the scroll viewport (plus a buffer) are
//! mounted. Row heights are fixed per kind, so the layout is a plain
//! prefix-sum table and the first visible row is found by binary search.
//!
//! # Core Types
//!
//! - [`VirtualRow`] - tagged row (section title, spacer, field item)
//! - [`RowHeights`] - fixed height per row kind
//! - [`OffsetTable`] - cumulative top offsets and total content height
//! - [`ViewportWindow`] - live scroll measurements
//! - [`resolve_window`] - O(log n + k) visible range lookup
//!
//! # Example
//!
//! ```
//! use fieldlist_widgets::virtualized::{
//!     OffsetTable, ScrollPadding, ViewportWindow, resolve_window,
//! };
//!
//! let table = OffsetTable::from_heights([32u32; 1000]);
//! let range = resolve_window(
//!     &table,
//!     ViewportWindow::new(3200, 400),
//!     ScrollPadding::new(256, 96),
//! );
//! assert_eq!(range, 89..124);
//! ```

use std::ops::Range;

use crate::partition::Partition;

/// Which half of the field list a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Fields currently shown as table columns.
    Displayed,
    /// Every other available field.
    Hidden,
}

impl Section {
    /// Heading text for the section title row.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Displayed => "Displayed fields",
            Self::Hidden => "Hidden fields",
        }
    }

    const fn key_prefix(self) -> &'static str {
        match self {
            Self::Displayed => "displayed",
            Self::Hidden => "hidden",
        }
    }
}

/// Row payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Heading placed before a non-empty section.
    SectionTitle(Section),
    /// Empty gap between the two sections.
    Spacer,
    /// A single field entry.
    FieldItem {
        /// The field name.
        name: String,
        /// Section the field was routed into.
        section: Section,
    },
}

/// Fixed height per row kind, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHeights {
    pub header: u32,
    pub spacer: u32,
    pub item: u32,
}

impl RowHeights {
    pub const DEFAULT_HEADER: u32 = 32;
    pub const DEFAULT_SPACER: u32 = 20;
    pub const DEFAULT_ITEM: u32 = 32;

    /// Height assigned to a row of the given kind.
    #[must_use]
    pub fn for_kind(&self, kind: &RowKind) -> u32 {
        match kind {
            RowKind::SectionTitle(_) => self.header,
            RowKind::Spacer => self.spacer,
            RowKind::FieldItem { .. } => self.item,
        }
    }
}

impl Default for RowHeights {
    fn default() -> Self {
        Self {
            header: Self::DEFAULT_HEADER,
            spacer: Self::DEFAULT_SPACER,
            item: Self::DEFAULT_ITEM,
        }
    }
}

/// One entry of the flattened list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRow {
    /// Stable identifier, unique within one build.
    pub key: String,
    pub kind: RowKind,
    pub height: u32,
}

impl VirtualRow {
    fn new(key: String, kind: RowKind, heights: &RowHeights) -> Self {
        let height = heights.for_kind(&kind);
        Self { key, kind, height }
    }

    /// Field name for item rows.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match &self.kind {
            RowKind::FieldItem { name, .. } => Some(name.as_str()),
            RowKind::SectionTitle(_) | RowKind::Spacer => None,
        }
    }
}

/// Flatten a partition into rows: displayed section, spacer, hidden section.
///
/// Empty sections emit nothing (no title). The spacer only appears when both
/// sections are non-empty.
#[must_use]
pub fn build_rows(partition: &Partition, heights: &RowHeights) -> Vec<VirtualRow> {
    let mut rows = Vec::with_capacity(partition.field_count() + 3);

    push_section(&mut rows, Section::Displayed, &partition.displayed, heights);
    if !partition.displayed.is_empty() && !partition.hidden.is_empty() {
        rows.push(VirtualRow::new("spacer".into(), RowKind::Spacer, heights));
    }
    push_section(&mut rows, Section::Hidden, &partition.hidden, heights);

    rows
}

fn push_section(
    rows: &mut Vec<VirtualRow>,
    section: Section,
    fields: &[String],
    heights: &RowHeights,
) {
    if fields.is_empty() {
        return;
    }
    let prefix = section.key_prefix();
    rows.push(VirtualRow::new(
        format!("{prefix}-title"),
        RowKind::SectionTitle(section),
        heights,
    ));
    // Index in the key: the field list tolerates duplicate names.
    rows.extend(fields.iter().enumerate().map(|(i, name)| {
        VirtualRow::new(
            format!("{prefix}-{i}-{name}"),
            RowKind::FieldItem {
                name: name.clone(),
                section,
            },
            heights,
        )
    }));
}

/// Cumulative top offsets for an ordered row sequence.
///
/// # Invariants
///
/// 1. `offset(0) == 0` when non-empty.
/// 2. `offset(i + 1) == offset(i) + height(i)`.
/// 3. `total_height() == offset(n - 1) + height(n - 1)`, or 0 when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u32>,
    total: u32,
}

impl OffsetTable {
    /// Running sum over `heights`. Saturates at `u32::MAX`.
    #[must_use]
    pub fn from_heights<I>(heights: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let heights = heights.into_iter();
        let mut offsets = Vec::with_capacity(heights.size_hint().0);
        let mut total = 0u32;
        for h in heights {
            offsets.push(total);
            total = total.saturating_add(h);
        }
        Self { offsets, total }
    }

    /// Offset table for built rows.
    #[must_use]
    pub fn for_rows(rows: &[VirtualRow]) -> Self {
        Self::from_heights(rows.iter().map(|r| r.height))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Top offset of row `idx`.
    #[must_use]
    pub fn offset(&self, idx: usize) -> Option<u32> {
        self.offsets.get(idx).copied()
    }

    /// Height of row `idx`, recovered from neighbouring offsets.
    #[must_use]
    pub fn height(&self, idx: usize) -> Option<u32> {
        let top = self.offset(idx)?;
        let bottom = self.offset(idx + 1).unwrap_or(self.total);
        Some(bottom - top)
    }

    /// Height of the whole scroll content.
    #[must_use]
    pub fn total_height(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Greatest index whose offset is `<= y`, clamped to 0.
    ///
    /// Returns `None` only for an empty table.
    #[must_use]
    pub fn index_at(&self, y: u32) -> Option<usize> {
        if self.offsets.is_empty() {
            return None;
        }
        let after = self.offsets.partition_point(|&top| top <= y);
        Some(after.saturating_sub(1))
    }
}

/// Live measurements of the scroll container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportWindow {
    pub scroll_top: u32,
    pub container_height: u32,
}

impl ViewportWindow {
    #[must_use]
    pub const fn new(scroll_top: u32, container_height: u32) -> Self {
        Self {
            scroll_top,
            container_height,
        }
    }
}

/// Extra pixels mounted on both sides of the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollPadding {
    /// Main rendering buffer.
    pub buffer: u32,
    /// Smaller margin guarding against flicker on fast scrolls.
    pub overscan: u32,
}

impl ScrollPadding {
    #[must_use]
    pub const fn new(buffer: u32, overscan: u32) -> Self {
        Self { buffer, overscan }
    }

    /// Padding expressed in rows of `row_height` pixels.
    #[must_use]
    pub const fn from_rows(buffer_rows: u32, overscan_rows: u32, row_height: u32) -> Self {
        Self {
            buffer: buffer_rows.saturating_mul(row_height),
            overscan: overscan_rows.saturating_mul(row_height),
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.buffer.saturating_add(self.overscan)
    }

    /// The padded pixel interval `[start_y, end_y)` for a viewport.
    #[must_use]
    pub fn span(&self, viewport: ViewportWindow) -> Range<u32> {
        let pad = self.total();
        let start = viewport.scroll_top.saturating_sub(pad);
        let end = viewport
            .scroll_top
            .saturating_add(viewport.container_height)
            .saturating_add(pad);
        start..end
    }
}

fn intersects(top: u32, height: u32, span: &Range<u32>) -> bool {
    top < span.end && top.saturating_add(height) > span.start
}

/// Index range of rows to mount for `viewport`.
///
/// Binary-searches the first candidate row, then walks forward until a row
/// starts at or past the end of the padded span. The range may be empty
/// when the viewport lies past the content.
#[must_use]
pub fn resolve_window(
    table: &OffsetTable,
    viewport: ViewportWindow,
    padding: ScrollPadding,
) -> Range<usize> {
    let span = padding.span(viewport);
    let Some(first) = table.index_at(span.start) else {
        return 0..0;
    };

    let mut start = None;
    let mut end = first;
    for idx in first..table.len() {
        let top = table.offsets[idx];
        if top >= span.end {
            break;
        }
        let height = table.height(idx).unwrap_or(0);
        if intersects(top, height, &span) {
            start.get_or_insert(idx);
            end = idx + 1;
        }
    }

    match start {
        Some(start) => start..end,
        None => 0..0,
    }
}

/// Linear-scan reference for [`resolve_window`].
///
/// Used by tests and benchmarks as the brute-force oracle.
#[must_use]
pub fn resolve_window_linear(
    table: &OffsetTable,
    viewport: ViewportWindow,
    padding: ScrollPadding,
) -> Range<usize> {
    let span = padding.span(viewport);
    let mut hits = (0..table.len()).filter(|&idx| {
        let top = table.offsets[idx];
        intersects(top, table.height(idx).unwrap_or(0), &span)
    });
    match hits.next() {
        Some(first) => {
            let last = hits.last().unwrap_or(first);
            first..last + 1
        }
        None => 0..0,
    }
}

/// A mounted row with its absolute position inside the scroll content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedRow<'a> {
    pub index: usize,
    pub top: u32,
    pub row: &'a VirtualRow,
}

/// Rows in `range` paired with their top offsets.
pub fn place_rows<'a>(
    rows: &'a [VirtualRow],
    table: &'a OffsetTable,
    range: Range<usize>,
) -> impl Iterator<Item = PlacedRow<'a>> + 'a {
    let end = range.end.min(rows.len()).min(table.len());
    let start = range.start.min(end);
    rows[start..end]
        .iter()
        .zip(&table.offsets[start..end])
        .enumerate()
        .map(move |(i, (row, &top))| PlacedRow {
            index: start + i,
            top,
            row,
        })
}
