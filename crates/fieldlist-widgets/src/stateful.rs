//! Persistence contract for widget state.
//!
//! The [`Stateful`] trait describes widgets whose user-facing state survives
//! sessions. [`SelectionStore`] is the narrow storage seam the field list
//! writes through; the runtime crate provides a registry-backed
//! implementation, and [`MemorySelectionStore`] serves tests and ephemeral
//! use.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | `SelectionStoreError::Corrupt` | Malformed stored JSON | Default selection |
//! | `SelectionStoreError::VersionMismatch` | Schema bump | Default selection |
//! | Missing entry | First run | Default selection |
//! | `SelectionStoreError::Backend` on save | Storage unavailable | In-memory state kept, logged |

use core::fmt;
use std::sync::{Arc, RwLock};

/// Unique identifier for a widget's persisted state.
///
/// The `(widget_type, instance_id)` pair maps a widget instance to its
/// stored blob.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StateKey {
    /// The widget type name (e.g., `"FieldList"`).
    pub widget_type: &'static str,
    /// Instance-unique identifier.
    pub instance_id: String,
}

impl StateKey {
    #[must_use]
    pub fn new(widget_type: &'static str, id: impl Into<String>) -> Self {
        Self {
            widget_type,
            instance_id: id.into(),
        }
    }

    /// Canonical string representation: `"widget_type::instance_id"`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}::{}", self.widget_type, self.instance_id)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.widget_type, self.instance_id)
    }
}

/// Opt-in trait for widgets with persistable state.
pub trait Stateful: Sized {
    /// The state type that gets persisted.
    ///
    /// Must implement `Default` so missing/corrupt state degrades gracefully.
    type State: Default;

    /// Unique key identifying this widget instance.
    fn state_key(&self) -> StateKey;

    /// Extract current state for persistence. Pure read.
    fn save_state(&self) -> Self::State;

    /// Restore state from persistence.
    ///
    /// Implementations should sanitise restored values rather than trust
    /// stored data.
    fn restore_state(&mut self, state: Self::State);

    /// State schema version. Stored state with another version is discarded.
    fn state_version() -> u32 {
        1
    }
}

/// Version-tagged wrapper for serialized widget state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct VersionedState<S> {
    /// Schema version (from `Stateful::state_version()`).
    pub version: u32,
    /// The actual state payload.
    pub data: S,
}

impl<S> VersionedState<S> {
    #[must_use]
    pub fn new(version: u32, data: S) -> Self {
        Self { version, data }
    }

    /// Pack a widget's state into a versioned envelope.
    pub fn pack<W: Stateful<State = S>>(widget: &W) -> Self {
        Self {
            version: W::state_version(),
            data: widget.save_state(),
        }
    }

    /// Unpack, returning `None` on version mismatch.
    pub fn unpack<W: Stateful<State = S>>(self) -> Option<S> {
        (self.version == W::state_version()).then_some(self.data)
    }
}

// ============================================================================
// Selection store
// ============================================================================

/// Errors surfaced by a [`SelectionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStoreError {
    /// Stored entry exists but cannot be decoded.
    Corrupt(String),
    /// Stored entry was written by an incompatible schema version.
    VersionMismatch { stored: u32, expected: u32 },
    /// The underlying storage failed or is unavailable.
    Backend(String),
}

impl fmt::Display for SelectionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupt(msg) => write!(f, "stored selection is corrupt: {msg}"),
            Self::VersionMismatch { stored, expected } => write!(
                f,
                "stored selection version {stored} does not match expected {expected}"
            ),
            Self::Backend(msg) => write!(f, "selection storage failed: {msg}"),
        }
    }
}

impl std::error::Error for SelectionStoreError {}

/// Durable key-value slot holding the display selection.
///
/// Writes fully replace the previous value (last writer wins).
pub trait SelectionStore {
    /// Load the stored selection. `Ok(None)` means nothing was stored yet.
    fn load_selection(&self) -> Result<Option<Vec<String>>, SelectionStoreError>;

    /// Overwrite the stored selection.
    fn save_selection(&self, fields: &[String]) -> Result<(), SelectionStoreError>;
}

impl<T: SelectionStore + ?Sized> SelectionStore for Arc<T> {
    fn load_selection(&self) -> Result<Option<Vec<String>>, SelectionStoreError> {
        (**self).load_selection()
    }

    fn save_selection(&self, fields: &[String]) -> Result<(), SelectionStoreError> {
        (**self).save_selection(fields)
    }
}

#[derive(Debug, Default)]
enum MemorySlot {
    #[default]
    Empty,
    Stored(Vec<String>),
    Corrupt(String),
}

/// In-memory [`SelectionStore`] for tests and sessions without persistence.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    slot: RwLock<MemorySlot>,
    writes: RwLock<usize>,
}

impl MemorySelectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a selection.
    #[must_use]
    pub fn with_selection<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slot: RwLock::new(MemorySlot::Stored(fields.into_iter().map(Into::into).collect())),
            writes: RwLock::new(0),
        }
    }

    /// Store whose entry fails to decode until overwritten.
    #[must_use]
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(MemorySlot::Corrupt(reason.into())),
            writes: RwLock::new(0),
        }
    }

    /// Currently stored selection, if any decodes.
    #[must_use]
    pub fn snapshot(&self) -> Option<Vec<String>> {
        match &*self.slot.read().ok()? {
            MemorySlot::Stored(fields) => Some(fields.clone()),
            MemorySlot::Empty | MemorySlot::Corrupt(_) => None,
        }
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.read().map(|w| *w).unwrap_or(0)
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load_selection(&self) -> Result<Option<Vec<String>>, SelectionStoreError> {
        let guard = self
            .slot
            .read()
            .map_err(|_| SelectionStoreError::Backend("lock poisoned".into()))?;
        match &*guard {
            MemorySlot::Empty => Ok(None),
            MemorySlot::Stored(fields) => Ok(Some(fields.clone())),
            MemorySlot::Corrupt(reason) => Err(SelectionStoreError::Corrupt(reason.clone())),
        }
    }

    fn save_selection(&self, fields: &[String]) -> Result<(), SelectionStoreError> {
        let mut guard = self
            .slot
            .write()
            .map_err(|_| SelectionStoreError::Backend("lock poisoned".into()))?;
        *guard = MemorySlot::Stored(fields.to_vec());
        if let Ok(mut writes) = self.writes.write() {
            *writes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    impl Stateful for Counter {
        type State = u32;

        fn state_key(&self) -> StateKey {
            StateKey::new("Counter", "main")
        }

        fn save_state(&self) -> u32 {
            self.value
        }

        fn restore_state(&mut self, state: u32) {
            self.value = state;
        }

        fn state_version() -> u32 {
            3
        }
    }

    #[test]
    fn state_key_canonical() {
        let key = StateKey::new("FieldList", "logSearchFields");
        assert_eq!(key.canonical(), "FieldList::logSearchFields");
        assert_eq!(key.to_string(), key.canonical());
    }

    #[test]
    fn versioned_state_round_trip() {
        let widget = Counter { value: 7 };
        let packed = VersionedState::pack(&widget);
        assert_eq!(packed.version, 3);
        assert_eq!(packed.unpack::<Counter>(), Some(7));
    }

    #[test]
    fn versioned_state_mismatch() {
        let stale = VersionedState::new(1, 9u32);
        assert_eq!(stale.unpack::<Counter>(), None);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemorySelectionStore::new();
        assert_eq!(store.load_selection(), Ok(None));
        store.save_selection(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(store.load_selection().unwrap(), Some(vec!["a".into(), "b".into()]));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn memory_store_corrupt_until_overwritten() {
        let store = MemorySelectionStore::corrupt("unexpected token");
        assert!(matches!(store.load_selection(), Err(SelectionStoreError::Corrupt(_))));
        assert_eq!(store.snapshot(), None);
        store.save_selection(&["x".to_string()]).unwrap();
        assert_eq!(store.snapshot(), Some(vec!["x".to_string()]));
    }

    #[test]
    fn store_through_arc() {
        let store = Arc::new(MemorySelectionStore::with_selection(["level"]));
        let shared: Arc<MemorySelectionStore> = Arc::clone(&store);
        assert_eq!(shared.load_selection().unwrap(), Some(vec!["level".to_string()]));
    }

    #[test]
    fn error_display() {
        let err = SelectionStoreError::VersionMismatch {
            stored: 1,
            expected: 2,
        };
        assert!(err.to_string().contains("version 1"));
        assert!(SelectionStoreError::Backend("disk".into()).to_string().contains("disk"));
    }
}
