#![forbid(unsafe_code)]

//! Virtualized field list facade.
//!
//! Re-exports the field list widget and its persistence runtime, and
//! offers a small prelude for host applications.

use std::fmt;

// --- Widget re-exports -----------------------------------------------------

pub use fieldlist_widgets::{
    DisplaySelection, FieldAction, FieldFilter, FieldList, FieldListConfig, MemorySelectionStore,
    OffsetTable, Partition, PlacedRow, RowHeights, RowKind, RowRenderer, ScrollPadding, Section,
    SelectionStore, SelectionStoreError, StateKey, Stateful, TextRenderer, ViewportWindow,
    VirtualRow, build_rows, partition_fields, resolve_window,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use fieldlist_runtime::{
    MemoryStorage, StateRegistry, StorageBackend, StorageError, StorageResult, StoredEntry,
};
#[cfg(feature = "state-persistence")]
pub use fieldlist_runtime::{FileStorage, RegistrySelectionStore};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for field list hosts.
#[derive(Debug)]
pub enum Error {
    /// I/O failure while reading field names or writing output.
    Io(std::io::Error),
    /// State storage failure.
    #[cfg(feature = "runtime")]
    Storage(StorageError),
    /// Selection store failure.
    Selection(SelectionStoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Storage(err) => write!(f, "{err}"),
            Self::Selection(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Storage(err) => Some(err),
            Self::Selection(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(feature = "runtime")]
impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<SelectionStoreError> for Error {
    fn from(err: SelectionStoreError) -> Self {
        Self::Selection(err)
    }
}

/// Standard result type for field list hosts.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DisplaySelection, Error, FieldAction, FieldList, FieldListConfig, Result, RowRenderer,
        Section, SelectionStore, TextRenderer,
    };

    #[cfg(feature = "runtime")]
    pub use crate::StateRegistry;
    #[cfg(feature = "state-persistence")]
    pub use crate::{FileStorage, RegistrySelectionStore};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
    pub use crate::widgets;
}

#[cfg(feature = "runtime")]
pub use fieldlist_runtime as runtime;
pub use fieldlist_widgets as widgets;
