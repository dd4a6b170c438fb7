//! The persistent key/value capability behind wizard progress.
//!
//! Provisioning state (visited steps, sticky completion flags) must survive
//! client restarts without depending on any platform storage API. The
//! [`PersistentStore`] trait is that capability: a tiny string map with
//! durable writes. Two backends ship here:
//!
//! - [`MemoryStore`] - plain map, the deterministic test double
//! - [`JsonFileStore`] - one JSON object per store, rewritten atomically
//!   (write temp file, then rename) on every mutation
//!
//! Components never hold a backend directly. They hold a [`FlagStore`],
//! a cheaply cloneable handle over the shared backend, the same way a
//! pooled database handle is cloned into each repository that needs it.

use crate::error::StoreResult;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Durable string-keyed storage. Object-safe so backends can be swapped at
/// runtime.
///
/// Reads are infallible by contract: whatever goes wrong underneath is
/// reported as an absent value, never an error.
pub trait PersistentStore: Send {
    /// Read a value, `None` when the key has never been written.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value durably.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backing medium rejects the write.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backing medium rejects the write.
    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

/// In-memory backend used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.map.remove(key);
        Ok(())
    }
}

/// File-backed backend: one JSON object, loaded at open, rewritten on every
/// mutation via write-temp-then-rename in the same directory.
///
/// An unreadable or malformed file downgrades to an empty map with a
/// warning; provisioning must survive a corrupt store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the parent directory cannot be
    /// created. A missing or corrupt data file is not an error.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let map = Self::load(&path);
        debug!(path = %path.display(), entries = map.len(), "flag store opened");
        Ok(JsonFileStore { path, map })
    }

    fn load(path: &Path) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "flag store unreadable, starting empty");
                return BTreeMap::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %path.display(), %err, "flag store corrupt, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn flush(&self) -> StoreResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PersistentStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.map.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        if self.map.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Cloneable handle over a shared [`PersistentStore`] backend.
///
/// The visited-step tracker and the completion-flag tracker write disjoint
/// keys into the same backend; each holds its own clone of this handle.
#[derive(Clone)]
pub struct FlagStore {
    inner: Arc<Mutex<Box<dyn PersistentStore>>>,
}

impl FlagStore {
    /// Wrap an explicit backend.
    #[must_use]
    pub fn new(backend: impl PersistentStore + 'static) -> Self {
        FlagStore {
            inner: Arc::new(Mutex::new(Box::new(backend))),
        }
    }

    /// Fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// File-backed store at `path`.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the store directory cannot be
    /// created.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self::new(JsonFileStore::open(path)?))
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn PersistentStore>> {
        // Single-threaded event path; recover rather than poison-cascade.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read a raw string value.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.lock().get(key)
    }

    /// Write a raw string value.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backend rejects the write.
    pub fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock().set(key, value)
    }

    /// Read a boolean flag. Only the exact value `"1"` reads as true;
    /// absent keys and anything else read as false.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.lock().get(key).as_deref() == Some("1")
    }

    /// Write a boolean flag. True stores `"1"`; false removes the key, so
    /// an untouched store and an explicitly cleared flag are
    /// indistinguishable, both meaning "not satisfied".
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backend rejects the write.
    pub fn set_bool(&self, key: &str, value: bool) -> StoreResult<()> {
        if value {
            self.lock().set(key, "1")
        } else {
            self.lock().remove(key)
        }
    }

    /// Delete a key.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the backend rejects the write.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.lock().remove(key)
    }
}

impl std::fmt::Debug for FlagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn bool_flags_use_sentinel_encoding() {
        let store = FlagStore::in_memory();
        assert!(!store.get_bool("flag"));

        store.set_bool("flag", true).unwrap();
        assert!(store.get_bool("flag"));
        assert_eq!(store.get_string("flag").as_deref(), Some("1"));

        store.set_bool("flag", false).unwrap();
        assert!(!store.get_bool("flag"));
        assert_eq!(store.get_string("flag"), None);
    }

    #[test]
    fn non_sentinel_values_read_as_false() {
        let store = FlagStore::in_memory();
        store.set_string("flag", "true").unwrap();
        assert!(!store.get_bool("flag"));
    }

    #[test]
    fn clones_share_the_backend() {
        let a = FlagStore::in_memory();
        let b = a.clone();
        a.set_string("k", "v").unwrap();
        assert_eq!(b.get_string("k").as_deref(), Some("v"));
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.json");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.set("setup_admin_pw_set_v1", "1").unwrap();
            store.set("setup_visited_steps_v1", "[\"welcome\"]").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("setup_admin_pw_set_v1").as_deref(), Some("1"));
        assert_eq!(
            store.get("setup_visited_steps_v1").as_deref(),
            Some("[\"welcome\"]")
        );
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.json");
        fs::write(&path, "{not json at all").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn file_store_removal_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.json");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.set("a", "1").unwrap();
            store.set("b", "1").unwrap();
            store.remove("a").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b").as_deref(), Some("1"));
    }

    #[test]
    fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/setup.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }
}
