#![forbid(unsafe_code)]

//! Core of the virtualized field list.
//!
//! Pure derivation from `(fields, selection, search)` to positioned rows,
//! plus the persistence and rendering seams the host plugs into.

pub mod field_list;
pub mod partition;
pub mod render;
pub mod selection;
pub mod stateful;
pub mod virtualized;

pub use field_list::{FieldList, FieldListConfig, OnAddToQuery, OnDisplayChange};
pub use partition::{FieldFilter, Partition, partition_fields};
pub use render::{FieldAction, RowRenderer, TextRenderer};
pub use selection::DisplaySelection;
pub use stateful::{
    MemorySelectionStore, SelectionStore, SelectionStoreError, StateKey, Stateful, VersionedState,
};
pub use virtualized::{
    OffsetTable, PlacedRow, RowHeights, RowKind, ScrollPadding, Section, ViewportWindow,
    VirtualRow, build_rows, resolve_window, resolve_window_linear,
};
