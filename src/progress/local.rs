use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info};

use crate::{log_event, logging::StorageEvent, Status};

use super::{
    decode_ids, encode_ids, BackendMode, LocalStorage, Notification, Notifications,
    ProgressBackend, PROGRESS_KEY,
};

/// Keeps the caught-set in device-scoped local storage.
pub struct LocalBackend {
    storage: LocalStorage,
}

impl LocalBackend {
    pub fn new(storage: LocalStorage) -> Self {
        LocalBackend { storage }
    }
}

#[async_trait]
impl ProgressBackend for LocalBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Local
    }

    fn load(&self) -> Result<Option<Vec<u64>>, Status> {
        match self.storage.get(PROGRESS_KEY)? {
            Some(value) => match decode_ids(&value) {
                Ok(ids) => Ok(Some(ids)),
                Err(status) => {
                    log_event!(StorageEvent::parse_failure(PROGRESS_KEY, status.to_string()));
                    Err(status)
                }
            },
            None => Ok(None),
        }
    }

    fn save(&self, ids: Vec<u64>, _total: usize) -> Option<JoinHandle<()>> {
        if let Err(status) = save_local(&self.storage, &ids) {
            error!("Failed to save local progress: {status}");
        }
        None
    }

    async fn subscribe(&self) -> Result<Notifications, Status> {
        let mut watch = self.storage.watch(PROGRESS_KEY)?;
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(change) = watch.changed().await {
                match change.new_value {
                    Some(_) => info!("{} changed in another tab", change.key),
                    None => info!("{} removed in another tab", change.key),
                }
                if tx.send(Notification::StorageChanged).is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}

/// Writes the full caught-set under the progress key.
pub fn save_local(storage: &LocalStorage, ids: &[u64]) -> Result<(), Status> {
    storage.set(PROGRESS_KEY, encode_ids(ids)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(dir: &tempfile::TempDir) -> (LocalBackend, LocalStorage) {
        let storage = LocalStorage::open(dir.path().join("local_storage.json")).unwrap();
        (LocalBackend::new(storage.clone()), storage)
    }

    #[test]
    fn load_empty_storage() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, _) = backend(&dir);

        assert_eq!(backend.load().unwrap(), None);
    }

    #[test]
    fn save_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, storage) = backend(&dir);

        assert!(backend.save(vec![1, 25, 150], 151).is_none());
        assert_eq!(
            storage.get(PROGRESS_KEY).unwrap().as_deref(),
            Some("[1,25,150]")
        );
        assert_eq!(backend.load().unwrap(), Some(vec![1, 25, 150]));
    }

    #[test]
    fn load_corrupted_value() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, storage) = backend(&dir);
        storage.set(PROGRESS_KEY, "{oops".to_owned()).unwrap();

        assert!(backend.load().unwrap_err().is_invalid_argument());
    }
}
