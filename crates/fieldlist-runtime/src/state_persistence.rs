//! Durable storage for the field selection.
//!
//! A [`StateRegistry`] caches versioned blobs keyed by canonical
//! [`StateKey`](fieldlist_widgets::StateKey) strings. [`flush`](StateRegistry::flush)
//! hands the whole map to a [`StorageBackend`], which replaces what it held
//! before (last writer wins).
//!
//! ```text
//!   RegistrySelectionStore ──set/flush──▶ StateRegistry ──save_all──▶ MemoryStorage
//!                                                                  └▶ FileStorage
//! ```
//!
//! Loading never panics. An unreadable state file surfaces as a
//! [`StorageError`]; the caller logs it and starts from an empty cache, so
//! the field list shows its default selection.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Failure while reading or writing stored state.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    /// The state file or an entry could not be encoded or decoded.
    Serialization(String),
    /// Internal bookkeeping is unusable (poisoned lock).
    Corruption(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "state I/O failed: {err}"),
            Self::Serialization(msg) => write!(f, "state encoding failed: {msg}"),
            Self::Corruption(msg) => write!(f, "state corrupted: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(_) | Self::Corruption(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

fn poisoned(what: &str) -> StorageError {
    StorageError::Corruption(format!("{what} lock poisoned"))
}

/// A versioned blob as held by a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    /// Canonical key, e.g. `FieldList::logSearchFields`.
    pub key: String,
    /// Schema version of `data`.
    pub version: u32,
    /// Encoded payload (JSON for the field selection).
    pub data: Vec<u8>,
}

/// Where flushed entries end up.
pub trait StorageBackend: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    /// Every stored entry; empty when nothing was saved yet.
    fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>>;

    /// Replace the stored entries with `entries`.
    fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()>;
}

/// Backend that lives as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned("memory storage"))?;
        Ok(entries.clone())
    }

    fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
        let mut stored = self.entries.write().map_err(|_| poisoned("memory storage"))?;
        stored.clone_from(entries);
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.read().map_or(0, |e| e.len());
        f.debug_struct("MemoryStorage").field("entries", &len).finish()
    }
}

#[cfg(feature = "state-persistence")]
mod file_storage {
    use super::{HashMap, StorageBackend, StorageError, StorageResult, StoredEntry};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    const FORMAT_VERSION: u32 = 1;

    /// On-disk layout of the state file.
    #[derive(Serialize, Deserialize)]
    struct Snapshot {
        format_version: u32,
        entries: HashMap<String, SnapshotEntry>,
    }

    #[derive(Serialize, Deserialize)]
    struct SnapshotEntry {
        version: u32,
        data_base64: String,
    }

    /// State kept in one JSON file.
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "entries": {
    ///     "FieldList::logSearchFields": {
    ///       "version": 1,
    ///       "data_base64": "eyJ2ZXJzaW9uIjoxLCJkYXRhIjpbXX0="
    ///     }
    ///   }
    /// }
    /// ```
    ///
    /// A save writes a sibling `.json.tmp` file, syncs it and renames it over
    /// the target, so readers see either the old or the new snapshot.
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// `$XDG_STATE_HOME/fieldlist/{app}/state.json`, else
        /// `$HOME/.local/state/...`, else relative to the working directory.
        #[must_use]
        pub fn default_for_app(app: &str) -> Self {
            Self::new(state_home().join("fieldlist").join(app).join("state.json"))
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    fn state_home() -> PathBuf {
        if let Ok(dir) = std::env::var("XDG_STATE_HOME")
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }
        std::env::var("HOME").map_or_else(
            |_| PathBuf::from("."),
            |home| PathBuf::from(home).join(".local").join("state"),
        )
    }

    fn decode(snapshot: Snapshot) -> HashMap<String, StoredEntry> {
        let mut entries = HashMap::with_capacity(snapshot.entries.len());
        for (key, entry) in snapshot.entries {
            let data = match STANDARD.decode(&entry.data_base64) {
                Ok(data) => data,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "dropping undecodable state entry");
                    continue;
                }
            };
            let version = entry.version;
            entries.insert(key.clone(), StoredEntry { key, version, data });
        }
        entries
    }

    fn encode(entries: &HashMap<String, StoredEntry>) -> Snapshot {
        Snapshot {
            format_version: FORMAT_VERSION,
            entries: entries
                .values()
                .map(|entry| {
                    let encoded = SnapshotEntry {
                        version: entry.version,
                        data_base64: STANDARD.encode(&entry.data),
                    };
                    (entry.key.clone(), encoded)
                })
                .collect(),
        }
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }

    impl StorageBackend for FileStorage {
        fn name(&self) -> &str {
            "FileStorage"
        }

        fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>> {
            let text = match fs::read_to_string(&self.path) {
                Ok(text) => text,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(HashMap::new());
                }
                Err(err) => return Err(err.into()),
            };
            let snapshot: Snapshot = serde_json::from_str(&text).map_err(|err| {
                StorageError::Serialization(format!("{}: {err}", self.path.display()))
            })?;

            if snapshot.format_version != FORMAT_VERSION {
                tracing::warn!(
                    path = %self.path.display(),
                    found = snapshot.format_version,
                    expected = FORMAT_VERSION,
                    "unknown state file format, ignoring it"
                );
                return Ok(HashMap::new());
            }
            Ok(decode(snapshot))
        }

        fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
            let bytes = serde_json::to_vec_pretty(&encode(entries))
                .map_err(|err| StorageError::Serialization(err.to_string()))?;
            write_atomic(&self.path, &bytes)?;
            tracing::debug!(
                path = %self.path.display(),
                entries = entries.len(),
                "wrote state file"
            );
            Ok(())
        }
    }

    impl fmt::Debug for FileStorage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStorage").field("path", &self.path).finish()
        }
    }
}

#[cfg(feature = "state-persistence")]
pub use file_storage::FileStorage;

#[derive(Default)]
struct Cache {
    entries: HashMap<String, StoredEntry>,
    dirty: bool,
}

/// Write-back cache in front of a [`StorageBackend`].
///
/// `Send + Sync`; share it between stores with [`shared`](Self::shared).
pub struct StateRegistry {
    backend: Box<dyn StorageBackend>,
    cache: RwLock<Cache>,
}

impl StateRegistry {
    /// Empty registry over `backend`; call [`load`](Self::load) to read it.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(Cache::default()),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    #[cfg(feature = "state-persistence")]
    #[must_use]
    pub fn with_file(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Replace the cache with the backend contents and return the entry count.
    ///
    /// On error the cache is left untouched.
    pub fn load(&self) -> StorageResult<usize> {
        let entries = self.backend.load_all()?;
        let count = entries.len();
        *self.cache.write().map_err(|_| poisoned("registry"))? = Cache {
            entries,
            dirty: false,
        };
        tracing::debug!(backend = self.backend.name(), count, "loaded state");
        Ok(count)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredEntry> {
        self.cache.read().ok()?.entries.get(key).cloned()
    }

    /// Insert or replace `key`. Nothing is written until [`flush`](Self::flush).
    pub fn set(&self, key: impl Into<String>, version: u32, data: Vec<u8>) -> StorageResult<()> {
        let key = key.into();
        let mut cache = self.cache.write().map_err(|_| poisoned("registry"))?;
        let entry = StoredEntry {
            key: key.clone(),
            version,
            data,
        };
        cache.entries.insert(key, entry);
        cache.dirty = true;
        Ok(())
    }

    /// Write pending changes. Returns `false` when there was nothing to write.
    ///
    /// The cache stays dirty if the backend fails, so the next flush retries.
    pub fn flush(&self) -> StorageResult<bool> {
        let mut cache = self.cache.write().map_err(|_| poisoned("registry"))?;
        if !cache.dirty {
            return Ok(false);
        }
        self.backend.save_all(&cache.entries)?;
        cache.dirty = false;
        Ok(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().map_or(0, |c| c.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cache.read().is_ok_and(|c| c.dirty)
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistry")
            .field("backend", &self.backend.name())
            .field("entries", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
