// Key-value persistence for the task collection

use crate::error::StorageError;
use crate::task::Task;
use fs2::FileExt;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A flat string-to-string store, the shape of a browser's local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend with an optional size quota
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total bytes held across all keys
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = self.used_excluding(key) + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory backend: each key lives in `<root>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open a file store rooted at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }

    /// Sidecar file serializing readers and writers of `key` across processes
    fn lock_for(&self, key: &str) -> Result<File, StorageError> {
        let path = self.root.join(format!("{}.lock", key));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        Ok(file)
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.lock_for(key)?;
        FileExt::lock_shared(&lock)?;
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        let lock = self.lock_for(key)?;
        FileExt::lock_exclusive(&lock)?;
        replace_file(&self.root, &path, value.as_bytes())?;

        // Lock is released when the lock file is dropped
        debug!(file = ?path, bytes = value.len(), "Wrote storage key");
        Ok(())
    }
}

/// Write `bytes` to a temp file in `staging_dir`, then rename it over `path`.
/// On any error `path` keeps its previous contents.
fn replace_file(staging_dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut staged = NamedTempFile::new_in(staging_dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Keys become file names, so keep them to a safe alphabet
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > 64 {
        return Err(StorageError::InvalidKey(format!("{} (max 64 chars)", key)));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(StorageError::InvalidKey(format!(
            "{} (must be alphanumeric with _/-)",
            key
        )));
    }
    Ok(())
}

/// Read the task collection stored under `key`
///
/// Never fails: a missing value, an unreadable backend or unparseable JSON all
/// yield an empty collection. Individual entries that are malformed, break the
/// task invariants, or repeat an earlier id are skipped with a warning.
pub fn load_tasks<S: KeyValueStore + ?Sized>(storage: &S, key: &str) -> Vec<Task> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "No stored tasks, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read stored tasks, starting empty");
            return Vec::new();
        }
    };

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(key, error = %e, "Stored tasks are not a JSON array, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let task: Task = match serde_json::from_value(entry) {
            Ok(t) => t,
            Err(e) => {
                warn!(key, index, error = %e, "Failed to parse task, skipping");
                continue;
            }
        };

        if !task.is_well_formed() {
            warn!(key, index, id = %task.id, "Task violates invariants, skipping");
            continue;
        }

        if !seen.insert(task.id.clone()) {
            warn!(key, index, id = %task.id, "Duplicate task id, skipping");
            continue;
        }

        tasks.push(task);
    }

    info!(key, count = tasks.len(), "Loaded tasks");
    tasks
}

/// Overwrite the value under `key` with the full collection
pub fn save_tasks<S: KeyValueStore + ?Sized>(storage: &mut S, key: &str, tasks: &[Task]) -> Result<(), StorageError> {
    let json = serde_json::to_string(tasks)?;
    storage.set(key, &json)
}
