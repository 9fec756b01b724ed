//! Property-based invariant tests for the field list.
//!
//! 1. Every non-synthetic field lands in exactly one section (empty search).
//! 2. Offsets start at 0 and advance by exactly the row height.
//! 3. Binary-search window resolution agrees with a linear scan.
//! 4. Adding the same field twice equals adding it once.
//! 5. Remove then add puts the field back at the end.
//! 6. The resolved window is contiguous and covers the viewport.
//! 7. Displayed rows always precede hidden rows.

use fieldlist_widgets::{
    DisplaySelection, FieldList, FieldListConfig, OffsetTable, RowHeights, RowKind, ScrollPadding,
    Section, ViewportWindow, build_rows, partition_fields, resolve_window, resolve_window_linear,
};
use proptest::prelude::*;

const SYNTHETIC: [&str; 3] = ["_msg", "_time", "*"];

// ── Strategies ────────────────────────────────────────────────────────────

fn field_name() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => "[a-z_]{1,8}",
        1 => Just("_msg".to_string()),
        1 => Just("_time".to_string()),
        1 => Just("*".to_string()),
    ]
}

fn field_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(field_name(), 0..40)
}

fn heights() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=64, 0..200)
}

fn synthetic() -> Vec<String> {
    SYNTHETIC.iter().map(|s| s.to_string()).collect()
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn partition_is_complete(
        fields in field_list(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
    ) {
        let chosen: Vec<String> = if fields.is_empty() {
            Vec::new()
        } else {
            picks.iter().map(|i| i.get(&fields).clone()).collect()
        };
        let selection = DisplaySelection::from_fields(chosen);
        let p = partition_fields(&fields, &selection, &synthetic(), "");

        for field in &fields {
            let in_displayed = p.displayed.contains(field);
            let in_hidden = p.hidden.contains(field);
            if SYNTHETIC.contains(&field.as_str()) {
                prop_assert!(!in_displayed && !in_hidden, "synthetic {field} listed");
            } else {
                prop_assert!(
                    in_displayed != in_hidden,
                    "{field} in displayed={in_displayed} hidden={in_hidden}"
                );
            }
        }
    }

    #[test]
    fn offsets_are_running_sum(hs in heights()) {
        let table = OffsetTable::from_heights(hs.iter().copied());
        prop_assert_eq!(table.len(), hs.len());
        if let Some(first) = table.offset(0) {
            prop_assert_eq!(first, 0);
        }
        for i in 0..hs.len() {
            prop_assert_eq!(table.height(i), Some(hs[i]));
            if i + 1 < hs.len() {
                prop_assert!(table.offset(i).unwrap() <= table.offset(i + 1).unwrap());
                prop_assert_eq!(table.offset(i + 1).unwrap() - table.offset(i).unwrap(), hs[i]);
            }
        }
        prop_assert_eq!(table.total_height(), hs.iter().sum::<u32>());
    }

    #[test]
    fn binary_and_linear_resolution_agree(
        hs in heights(),
        scroll_top in 0u32..15_000,
        container in 1u32..2_000,
        buffer in 0u32..600,
        overscan in 0u32..200,
    ) {
        let table = OffsetTable::from_heights(hs);
        let viewport = ViewportWindow::new(scroll_top, container);
        let padding = ScrollPadding::new(buffer, overscan);
        prop_assert_eq!(
            resolve_window(&table, viewport, padding),
            resolve_window_linear(&table, viewport, padding)
        );
    }

    #[test]
    fn window_is_contiguous_and_covers_viewport(
        n in 1usize..500,
        scroll_top in 0u32..20_000,
        container in 1u32..1_000,
    ) {
        let table = OffsetTable::from_heights(std::iter::repeat_n(32u32, n));
        let padding = ScrollPadding::from_rows(8, 3, 32);
        let range = resolve_window(&table, ViewportWindow::new(scroll_top, container), padding);

        let span = padding.span(ViewportWindow::new(scroll_top, container));
        for idx in 0..n {
            let top = table.offset(idx).unwrap();
            let intersects = top < span.end && top + 32 > span.start;
            prop_assert_eq!(range.contains(&idx), intersects, "row {}", idx);
        }

        let visible_end = (scroll_top + container).min(table.total_height());
        if scroll_top < visible_end {
            let first = table.offset(range.start).unwrap();
            let last = range.end - 1;
            prop_assert!(first <= scroll_top);
            prop_assert!(table.offset(last).unwrap() + 32 >= visible_end);
        }
    }

    #[test]
    fn add_is_idempotent(field in "[a-z]{1,6}") {
        let mut once = FieldList::new(FieldListConfig::default());
        once.add(&field);
        let mut twice = FieldList::new(FieldListConfig::default());
        twice.add(&field);
        twice.add(&field);
        prop_assert_eq!(once.selection(), twice.selection());
    }

    #[test]
    fn remove_then_add_restores_at_end(
        extra in prop::collection::vec("[a-z]{1,6}", 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut list = FieldList::new(FieldListConfig::default());
        for f in &extra {
            list.add(f);
        }
        let target = pick.get(&extra).clone();
        prop_assume!(!list.config().is_pinned(&target));
        list.remove(&target);
        prop_assert!(!list.selection().contains(&target));
        list.add(&target);
        prop_assert!(list.selection().contains(&target));
        prop_assert_eq!(list.selection().iter().last(), Some(target.as_str()));
    }

    #[test]
    fn displayed_rows_precede_hidden_rows(fields in field_list(), search in "[a-z]{0,2}") {
        let selection = DisplaySelection::from_fields(fields.iter().take(3).cloned());
        let p = partition_fields(&fields, &selection, &synthetic(), &search);
        let rows = build_rows(&p, &RowHeights::default());

        let mut seen_hidden = false;
        for row in &rows {
            match &row.kind {
                RowKind::SectionTitle(Section::Hidden)
                | RowKind::FieldItem { section: Section::Hidden, .. } => seen_hidden = true,
                RowKind::SectionTitle(Section::Displayed)
                | RowKind::FieldItem { section: Section::Displayed, .. } => {
                    prop_assert!(!seen_hidden);
                }
                RowKind::Spacer => {
                    prop_assert!(!p.displayed.is_empty() && !p.hidden.is_empty());
                }
            }
        }
        let expected = p.field_count()
            + usize::from(!p.displayed.is_empty())
            + usize::from(!p.hidden.is_empty())
            + usize::from(!p.displayed.is_empty() && !p.hidden.is_empty());
        prop_assert_eq!(rows.len(), expected);
    }
}

// ── Concrete scenarios ────────────────────────────────────────────────────

#[test]
fn scenario_container_400_at_top() {
    let mut list = FieldList::new(FieldListConfig::default());
    list.set_fields((0..200).map(|i| format!("f{i}")));
    list.on_resize(400);
    list.on_scroll(0);

    let window = list.window();
    assert_eq!(window.start, 0);
    let last = window.end - 1;
    let bottom = list.offsets().offset(last).unwrap() + list.offsets().height(last).unwrap();
    assert!(bottom >= 400);
    let indices: Vec<usize> = list.visible_rows().map(|r| r.index).collect();
    assert!(indices.windows(2).all(|w| w[1] == w[0] + 1));
}
