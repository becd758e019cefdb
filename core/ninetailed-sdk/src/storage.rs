//! Fallback key/value storage.
//!
//! A tiny last-known-good cache: the anonymous profile id, the last
//! profile with its experiences and changes, and the debug flag. Writes
//! are last-write-wins.

use ninetailed_types::{Change, Profile, SelectedVariantInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage keys.
pub mod keys {
    pub const ANONYMOUS_ID: &str = "__nt_anonymous_id__";
    pub const PROFILE: &str = "__nt_profile__";
    pub const EXPERIENCES: &str = "__nt_experiences__";
    pub const CHANGES: &str = "__nt_changes__";
    pub const DEBUG: &str = "__nt_debug__";
    /// Pre-namespacing key for the anonymous id, migrated on startup.
    pub const LEGACY_ANONYMOUS_ID: &str = "__anon_id__";
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A synchronous JSON key/value store.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Removes every key in `keys` as one write.
    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        keys.iter().try_for_each(|key| self.remove(key))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.values).is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        lock(&self.values).remove(key);
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let mut values = lock(&self.values);
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

/// Storage persisted as one JSON object in a file.
///
/// The file is read once on open and rewritten on every change through a
/// temporary file and rename.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStorage {
    /// Opens `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            debug!("No storage file at {:?}, starting empty", path);
            Map::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value);
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let mut values = lock(&self.values);
        let mut changed = false;
        for key in keys {
            changed |= values.remove(*key).is_some();
        }
        if changed {
            self.persist(&values)?;
        }
        Ok(())
    }
}

/// Typed access to the fallback state on top of a [`Storage`].
///
/// Read failures and undecodable values are logged and treated as absent.
/// Every [`clear`](Self::clear) starts a new generation; a successful
/// flush begun in an older generation is not persisted. Clones share the
/// generation.
#[derive(Clone)]
pub struct FallbackCache {
    storage: Arc<dyn Storage>,
    generation: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for FallbackCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCache").finish_non_exhaustive()
    }
}

impl FallbackCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// Current generation, bumped by every [`clear`](Self::clear).
    pub fn generation(&self) -> u64 {
        *lock(&self.generation)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.storage.get(key) {
            Ok(v) => v?,
            Err(e) => {
                warn!(key, error = %e, "failed to read fallback storage");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable fallback value");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.storage.set(key, serde_json::to_value(value)?)
    }

    pub fn anonymous_id(&self) -> Option<String> {
        self.read::<String>(keys::ANONYMOUS_ID)
            .filter(|id| !id.is_empty())
    }

    pub fn set_anonymous_id(&self, id: &str) -> StorageResult<()> {
        self.write(keys::ANONYMOUS_ID, &id)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.read(keys::PROFILE)
    }

    pub fn experiences(&self) -> Vec<SelectedVariantInfo> {
        self.read(keys::EXPERIENCES).unwrap_or_default()
    }

    pub fn changes(&self) -> Vec<Change> {
        self.read(keys::CHANGES).unwrap_or_default()
    }

    pub fn debug(&self) -> bool {
        self.read(keys::DEBUG).unwrap_or(false)
    }

    pub fn set_debug(&self, enabled: bool) -> StorageResult<()> {
        self.write(keys::DEBUG, &enabled)
    }

    /// Overwrites the cached state after a successful flush.
    pub fn store_success(
        &self,
        profile: &Profile,
        experiences: &[SelectedVariantInfo],
        changes: &[Change],
    ) -> StorageResult<()> {
        let _generation = lock(&self.generation);
        self.write_success(profile, experiences, changes)
    }

    /// Like [`store_success`](Self::store_success), but only while the
    /// cache is still at `generation`. Returns false if a clear happened
    /// in between and nothing was written.
    pub fn store_success_in(
        &self,
        generation: u64,
        profile: &Profile,
        experiences: &[SelectedVariantInfo],
        changes: &[Change],
    ) -> StorageResult<bool> {
        let current = lock(&self.generation);
        if *current != generation {
            debug!(stale = generation, current = *current, "skipping stale profile write");
            return Ok(false);
        }
        self.write_success(profile, experiences, changes)?;
        Ok(true)
    }

    fn write_success(
        &self,
        profile: &Profile,
        experiences: &[SelectedVariantInfo],
        changes: &[Change],
    ) -> StorageResult<()> {
        self.set_anonymous_id(&profile.id)?;
        self.write(keys::PROFILE, profile)?;
        self.write(keys::EXPERIENCES, &experiences)?;
        self.write(keys::CHANGES, &changes)
    }

    /// Forgets the visitor: anonymous id, profile, experiences and changes.
    ///
    /// The keys are removed in one storage write and a new generation
    /// starts, so in-flight flushes no longer persist their result.
    pub fn clear(&self) -> StorageResult<()> {
        let mut generation = lock(&self.generation);
        *generation += 1;
        self.storage
            .remove_many(&[
                keys::ANONYMOUS_ID,
                keys::PROFILE,
                keys::EXPERIENCES,
                keys::CHANGES,
            ])
            .inspect_err(|e| warn!(error = %e, "failed to clear fallback storage"))
    }

    /// Moves an anonymous id stored under the legacy key to the current key.
    ///
    /// An id already present under the current key wins. The legacy key is
    /// deleted either way. Returns true if an id was migrated.
    pub fn migrate_legacy_anonymous_id(&self) -> StorageResult<bool> {
        let Some(legacy) = self.read::<String>(keys::LEGACY_ANONYMOUS_ID) else {
            return Ok(false);
        };

        let migrated = if self.anonymous_id().is_none() && !legacy.is_empty() {
            self.set_anonymous_id(&legacy)?;
            info!("Migrated legacy anonymous id");
            true
        } else {
            false
        };
        self.storage.remove(keys::LEGACY_ANONYMOUS_ID)?;
        Ok(migrated)
    }
}
