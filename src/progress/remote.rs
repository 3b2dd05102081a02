use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{documents::SharedProgress, Status};

use super::{
    local::save_local, BackendMode, DocumentStore, LocalStorage, Notification, Notifications,
    ProgressBackend,
};

/// Keeps the caught-set in a document shared by every player.
///
/// Writes replace the whole caught list (last write wins). A failed write is
/// retried once against local storage so the mutation survives a reload.
pub struct RemoteBackend<D: DocumentStore> {
    document: Arc<D>,
    fallback: LocalStorage,
}

impl<D: DocumentStore> RemoteBackend<D> {
    pub fn new(document: Arc<D>, fallback: LocalStorage) -> Self {
        RemoteBackend { document, fallback }
    }
}

#[async_trait]
impl<D: DocumentStore> ProgressBackend for RemoteBackend<D> {
    fn mode(&self) -> BackendMode {
        BackendMode::Shared
    }

    fn load(&self) -> Result<Option<Vec<u64>>, Status> {
        Ok(None)
    }

    fn save(&self, ids: Vec<u64>, total: usize) -> Option<JoinHandle<()>> {
        let document = Arc::clone(&self.document);
        let fallback = self.fallback.clone();

        Some(tokio::spawn(async move {
            let progress = SharedProgress::new(ids, total);
            match document.write(&progress).await {
                Ok(()) => info!("shared progress saved"),
                Err(status) => {
                    error!("Failed to save shared progress: {status}");
                    let ids = progress.caught_pokemon.unwrap_or_default();
                    if let Err(status) = save_local(&fallback, &ids) {
                        error!("Fallback to local storage failed: {status}");
                    }
                }
            }
        }))
    }

    /// Attaches the listener before the initial read. Changes seen by the
    /// listener are delivered after the read result, so the last
    /// notification always carries the latest state.
    async fn subscribe(&self) -> Result<Notifications, Status> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (listener_tx, mut listener_rx) = mpsc::unbounded_channel();
        self.document.listen(listener_tx).await?;

        let initial = match self.document.read().await {
            Ok(Some(progress)) => Notification::Snapshot(progress),
            Ok(None) => Notification::Missing,
            Err(status) => {
                warn!("Initial read of shared progress failed: {status}");
                Notification::Failed(status)
            }
        };
        let _ = tx.send(initial);

        tokio::spawn(async move {
            while let Some(notification) = listener_rx.recv().await {
                if tx.send(notification).is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn shutdown(&self) {
        self.document.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{MemoryDocument, PROGRESS_KEY};

    fn backend(dir: &tempfile::TempDir, document: Arc<MemoryDocument>) -> RemoteBackend<MemoryDocument> {
        let storage = LocalStorage::open(dir.path().join("local_storage.json")).unwrap();
        RemoteBackend::new(document, storage)
    }

    #[tokio::test]
    async fn save_replaces_caught_list() {
        let dir = tempfile::tempdir().unwrap();
        let document = Arc::new(MemoryDocument::new());
        let backend = backend(&dir, Arc::clone(&document));

        backend.save(vec![1, 2, 3], 151).unwrap().await.unwrap();
        backend.save(vec![2], 151).unwrap().await.unwrap();

        let progress = document.read().await.unwrap().unwrap();
        assert_eq!(progress.caught_pokemon, Some(vec![2]));
        assert_eq!(progress.total_pokemon, 151);
    }

    #[tokio::test]
    async fn failed_save_falls_back_to_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let document = Arc::new(MemoryDocument::new());
        document.set_fail_writes(true);
        let backend = backend(&dir, Arc::clone(&document));

        backend.save(vec![4, 7], 151).unwrap().await.unwrap();

        assert_eq!(document.read().await.unwrap(), None);
        assert_eq!(
            backend.fallback.get(PROGRESS_KEY).unwrap().as_deref(),
            Some("[4,7]")
        );
    }

    #[tokio::test]
    async fn subscribe_reports_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir, Arc::new(MemoryDocument::new()));

        let mut notifications = backend.subscribe().await.unwrap();
        assert_eq!(notifications.recv().await, Some(Notification::Missing));
    }

    #[tokio::test]
    async fn subscribe_delivers_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let document = Arc::new(MemoryDocument::new());
        let backend = backend(&dir, Arc::clone(&document));
        document.write(&SharedProgress::new(vec![1], 2)).await.unwrap();

        let mut notifications = backend.subscribe().await.unwrap();
        match notifications.recv().await {
            Some(Notification::Snapshot(progress)) => {
                assert_eq!(progress.caught_pokemon, Some(vec![1]))
            }
            other => panic!("unexpected notification {other:?}"),
        }

        document.write(&SharedProgress::new(vec![1, 2], 2)).await.unwrap();
        match notifications.recv().await {
            Some(Notification::Snapshot(progress)) => {
                assert_eq!(progress.caught_pokemon, Some(vec![1, 2]))
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    /// Another client writes while the initial read is in flight.
    struct WriteDuringRead {
        inner: MemoryDocument,
        concurrent: SharedProgress,
    }

    #[async_trait]
    impl DocumentStore for WriteDuringRead {
        async fn read(&self) -> Result<Option<SharedProgress>, Status> {
            let before = self.inner.read().await?;
            self.inner.write(&self.concurrent).await?;
            Ok(before)
        }

        async fn write(&self, progress: &SharedProgress) -> Result<(), Status> {
            self.inner.write(progress).await
        }

        async fn listen(&self, notifications: mpsc::UnboundedSender<Notification>) -> Result<(), Status> {
            self.inner.listen(notifications).await
        }
    }

    #[tokio::test]
    async fn write_during_initial_read_is_delivered_last() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path().join("local_storage.json")).unwrap();
        let inner = MemoryDocument::new();
        inner.write(&SharedProgress::new(vec![1], 2)).await.unwrap();
        let document = WriteDuringRead {
            inner,
            concurrent: SharedProgress::new(vec![1, 2], 2),
        };
        let backend = RemoteBackend::new(Arc::new(document), storage);

        let mut notifications = backend.subscribe().await.unwrap();

        let mut caught = vec![];
        for _ in 0..2 {
            match notifications.recv().await {
                Some(Notification::Snapshot(progress)) => caught.push(progress.caught_pokemon),
                other => panic!("unexpected notification {other:?}"),
            }
        }
        assert_eq!(caught, vec![Some(vec![1]), Some(vec![1, 2])]);
    }
}
