#![forbid(unsafe_code)]

//! Persistence runtime for the field list.
//!
//! [`StateRegistry`] caches state entries in front of a [`StorageBackend`];
//! [`RegistrySelectionStore`] adapts it to the widget's
//! [`SelectionStore`](fieldlist_widgets::SelectionStore) seam.

pub mod state_persistence;

#[cfg(feature = "state-persistence")]
pub mod selection_store;

#[cfg(feature = "state-persistence")]
pub use selection_store::RegistrySelectionStore;
#[cfg(feature = "state-persistence")]
pub use state_persistence::FileStorage;
pub use state_persistence::{
    MemoryStorage, StateRegistry, StorageBackend, StorageError, StorageResult, StoredEntry,
};
