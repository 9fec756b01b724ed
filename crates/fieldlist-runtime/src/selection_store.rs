//! [`SelectionStore`] backed by a shared [`StateRegistry`].
//!
//! The selection is stored as JSON under the widget's canonical state key,
//! wrapped in a [`VersionedState`] envelope:
//!
//! ```json
//! {"version":1,"data":["timestamp","message","host"]}
//! ```

use std::sync::Arc;

use fieldlist_widgets::field_list::DEFAULT_INSTANCE_ID;
use fieldlist_widgets::{
    FieldList, SelectionStore, SelectionStoreError, StateKey, Stateful, VersionedState,
};

use crate::state_persistence::StateRegistry;

/// Persists a field list's display selection in a [`StateRegistry`].
///
/// Every save writes the entry and flushes the registry, so the stored
/// selection always reflects the last mutation.
#[derive(Debug, Clone)]
pub struct RegistrySelectionStore {
    registry: Arc<StateRegistry>,
    key: StateKey,
}

impl RegistrySelectionStore {
    /// Store under `FieldList::logSearchFields`.
    #[must_use]
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        Self::for_instance(registry, DEFAULT_INSTANCE_ID)
    }

    /// Store under `FieldList::{instance_id}`.
    #[must_use]
    pub fn for_instance(registry: Arc<StateRegistry>, instance_id: impl Into<String>) -> Self {
        Self {
            registry,
            key: StateKey::new("FieldList", instance_id),
        }
    }

    #[must_use]
    pub fn key(&self) -> &StateKey {
        &self.key
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }
}

impl SelectionStore for RegistrySelectionStore {
    fn load_selection(&self) -> Result<Option<Vec<String>>, SelectionStoreError> {
        let Some(entry) = self.registry.get(&self.key.canonical()) else {
            return Ok(None);
        };

        let expected = <FieldList as Stateful>::state_version();
        if entry.version != expected {
            return Err(SelectionStoreError::VersionMismatch {
                stored: entry.version,
                expected,
            });
        }

        let envelope: VersionedState<Vec<String>> = serde_json::from_slice(&entry.data)
            .map_err(|e| SelectionStoreError::Corrupt(e.to_string()))?;
        let stored = envelope.version;
        envelope
            .unpack::<FieldList>()
            .map(Some)
            .ok_or(SelectionStoreError::VersionMismatch { stored, expected })
    }

    fn save_selection(&self, fields: &[String]) -> Result<(), SelectionStoreError> {
        let version = <FieldList as Stateful>::state_version();
        let envelope = VersionedState::new(version, fields);
        let data = serde_json::to_vec(&envelope)
            .map_err(|e| SelectionStoreError::Backend(e.to_string()))?;

        self.registry
            .set(self.key.canonical(), version, data)
            .map_err(|e| SelectionStoreError::Backend(e.to_string()))?;
        self.registry
            .flush()
            .map_err(|e| SelectionStoreError::Backend(e.to_string()))?;
        Ok(())
    }
}
