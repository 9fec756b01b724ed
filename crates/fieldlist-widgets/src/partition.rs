//! Splitting a field list into displayed and hidden sections.
//!
//! The displayed section follows the order of the [`DisplaySelection`]
//! (it defines table column order). The hidden section follows the order of
//! the incoming field list. Synthetic fields and the wildcard marker never
//! appear in either section.
//!
//! Filtering is a case-insensitive substring match applied to each section
//! independently; relative order is preserved.

use crate::selection::DisplaySelection;

/// The two filtered sections produced by [`partition_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Selected fields matching the search, in selection order.
    pub displayed: Vec<String>,
    /// Unselected fields matching the search, in input order.
    pub hidden: Vec<String>,
}

impl Partition {
    /// True when neither section has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty() && self.hidden.is_empty()
    }

    /// Total number of field entries across both sections.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.displayed.len() + self.hidden.len()
    }
}

/// Case-insensitive substring matcher built once per search string.
///
/// An empty (or whitespace-only) search matches everything.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    needle: Option<String>,
}

impl FieldFilter {
    /// Build a filter for the given search text.
    ///
    /// Surrounding whitespace is part of the needle; only a blank search
    /// disables filtering.
    #[must_use]
    pub fn new(search: &str) -> Self {
        let needle = if search.trim().is_empty() {
            None
        } else {
            Some(search.to_lowercase())
        };
        Self { needle }
    }

    /// Whether this filter lets every field through.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.needle.is_none()
    }

    /// Check a single field name against the filter.
    #[must_use]
    pub fn matches(&self, field: &str) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => field.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Partition `fields` against `selection`, then filter both sides by `search`.
///
/// `excluded` names the synthetic fields (and wildcard marker) that belong to
/// neither section.
#[must_use]
pub fn partition_fields<S: AsRef<str>>(
    fields: &[S],
    selection: &DisplaySelection,
    excluded: &[String],
    search: &str,
) -> Partition {
    let filter = FieldFilter::new(search);
    let is_excluded = |name: &str| excluded.iter().any(|e| e == name);

    let displayed = selection
        .iter()
        .filter(|&name| !is_excluded(name) && filter.matches(name))
        .map(str::to_owned)
        .collect();

    let hidden = fields
        .iter()
        .map(|field| AsRef::<str>::as_ref(field))
        .filter(|&name| !is_excluded(name) && !selection.contains(name))
        .filter(|&name| filter.matches(name))
        .map(str::to_owned)
        .collect();

    Partition { displayed, hidden }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> Vec<String> {
        vec!["_msg".into(), "_time".into(), "*".into()]
    }

    fn fields() -> Vec<&'static str> {
        vec!["timestamp", "message", "host", "level", "trace_id"]
    }

    #[test]
    fn empty_search_splits_by_selection() {
        let sel = DisplaySelection::from_fields(["timestamp", "message"]);
        let p = partition_fields(&fields(), &sel, &synthetic(), "");
        assert_eq!(p.displayed, vec!["timestamp", "message"]);
        assert_eq!(p.hidden, vec!["host", "level", "trace_id"]);
        assert_eq!(p.field_count(), 5);
    }

    #[test]
    fn search_filters_each_section() {
        let sel = DisplaySelection::from_fields(["timestamp", "message"]);
        let p = partition_fields(&fields(), &sel, &synthetic(), "ho");
        assert!(p.displayed.is_empty());
        assert_eq!(p.hidden, vec!["host"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let sel = DisplaySelection::from_fields(["Timestamp"]);
        let p = partition_fields(&["Timestamp", "HOST"], &sel, &synthetic(), "tIMe");
        assert_eq!(p.displayed, vec!["Timestamp"]);
        assert!(p.hidden.is_empty());

        let p = partition_fields(&["Timestamp", "HOST"], &sel, &synthetic(), "host");
        assert_eq!(p.hidden, vec!["HOST"]);
    }

    #[test]
    fn synthetic_fields_are_never_listed() {
        let sel = DisplaySelection::from_fields(["_msg", "level"]);
        let p = partition_fields(&["_msg", "_time", "*", "level", "host"], &sel, &synthetic(), "");
        assert_eq!(p.displayed, vec!["level"]);
        assert_eq!(p.hidden, vec!["host"]);
    }

    #[test]
    fn displayed_follows_selection_order() {
        let sel = DisplaySelection::from_fields(["level", "host"]);
        let p = partition_fields(&["host", "level"], &sel, &synthetic(), "");
        assert_eq!(p.displayed, vec!["level", "host"]);
    }

    #[test]
    fn whitespace_search_is_pass_through() {
        assert!(FieldFilter::new("   ").is_pass_through());
        assert!(FieldFilter::new("").matches("anything"));
        assert!(!FieldFilter::new("x").is_pass_through());
    }

    #[test]
    fn whitespace_is_part_of_the_needle() {
        let sel = DisplaySelection::default();
        let p = partition_fields(&["host", "my host"], &sel, &[], "ho ");
        assert!(p.hidden.is_empty());

        let p = partition_fields(&["host", "my host"], &sel, &[], " HO");
        assert_eq!(p.hidden, vec!["my host"]);
    }

    #[test]
    fn empty_inputs_yield_empty_partition() {
        let sel = DisplaySelection::default();
        let p = partition_fields::<&str>(&[], &sel, &synthetic(), "abc");
        assert!(p.is_empty());
    }
}
