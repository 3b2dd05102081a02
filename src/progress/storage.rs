use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::warn;

use crate::{log_event, logging::StorageEvent, Status};

/// Device-scoped string key-value storage backed by a JSON file.
///
/// Every handle opened on the same file behaves like a browser tab sharing
/// `localStorage`: writes are visible to all handles, and `watch` reports
/// changes made by other handles or processes but never the handle's own
/// writes.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,

    /// Writes of this handle not yet observed by a watcher. Also serializes
    /// read-modify-write cycles of the handle.
    pending: Mutex<HashMap<String, String>>,
}

/// A change of a watched key made outside the observing handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub new_value: Option<String>,
}

impl LocalStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Status> {
        let path = path.as_ref();
        let file_name = path.file_name().ok_or_else(|| {
            Status::invalid_argument(format!("Storage path '{}' is not a file", path.display()))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        Ok(LocalStorage {
            inner: Arc::new(Inner {
                path: parent.canonicalize()?.join(file_name),
                pending: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, Status> {
        let result = self.read_all().map(|mut items| items.remove(key));
        if let Err(status) = &result {
            log_event!(StorageEvent::read(key, Some(status.to_string())));
        }
        result
    }

    pub fn set(&self, key: &str, value: String) -> Result<(), Status> {
        let result = self.update(key, value);
        log_event!(StorageEvent::write(
            key,
            result.as_ref().err().map(|e| e.to_string())
        ));
        result
    }

    /// Starts observing `key`. Changes are delivered until the returned
    /// `StorageWatch` is dropped.
    pub fn watch(&self, key: &str) -> Result<StorageWatch, Status> {
        let (tx, rx) = mpsc::unbounded_channel();
        let storage = self.clone();
        let key = key.to_owned();
        let target = self.inner.path.clone();
        let mut last_seen = self.get(&key).unwrap_or_default();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("storage watch error: {e}");
                    return;
                }
            };
            if matches!(event.kind, EventKind::Access(_)) || !event.paths.contains(&target) {
                return;
            }

            let Ok((current, own_write)) = storage.observe(&key) else {
                return;
            };
            match own_write {
                Some(true) => {
                    last_seen = current;
                    return;
                }
                // Superseded by another writer: the handle holds stale state.
                Some(false) => {}
                None if current == last_seen => return,
                None => {}
            }
            last_seen = current.clone();

            log_event!(StorageEvent::external_change(&key));
            let _ = tx.send(StorageChange {
                key: key.clone(),
                new_value: current,
            });
        })?;

        let dir = self.inner.path.parent().unwrap_or(Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(StorageWatch {
            _watcher: watcher,
            changes: rx,
        })
    }

    /// Reads `key` and settles the pending write of this handle, if any.
    /// The flag is true when the stored value is that write.
    fn observe(&self, key: &str) -> Result<(Option<String>, Option<bool>), Status> {
        let mut pending = self.lock_pending()?;
        let current = self.read_all()?.remove(key);
        let own_write = pending
            .remove(key)
            .map(|written| current.as_deref() == Some(written.as_str()));
        Ok((current, own_write))
    }

    fn update(&self, key: &str, value: String) -> Result<(), Status> {
        let mut pending = self.lock_pending()?;
        let mut items = self.read_all()?;
        items.insert(key.to_owned(), value.clone());
        self.write_all(&items)?;
        pending.insert(key.to_owned(), value);
        Ok(())
    }

    fn lock_pending(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, Status> {
        self.inner
            .pending
            .lock()
            .map_err(|_| Status::internal("local storage lock poisoned"))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, Status> {
        match fs::read(&self.inner.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Status::invalid_argument(format!(
                    "Storage file '{}' failed to parse: {e}",
                    self.inner.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the storage file atomically so readers never observe a
    /// partial write.
    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), Status> {
        let dir = self.inner.path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(items)?)?;
        tmp.persist(&self.inner.path).map_err(|e| e.error)?;
        Ok(())
    }
}

pub struct StorageWatch {
    _watcher: RecommendedWatcher,
    changes: mpsc::UnboundedReceiver<StorageChange>,
}

impl StorageWatch {
    /// Waits for the next external change.
    pub async fn changed(&mut self) -> Option<StorageChange> {
        self.changes.recv().await
    }
}
