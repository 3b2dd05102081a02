use std::{collections::BTreeSet, fmt, sync::Arc};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{log_event, logging::ProgressEvent, Status};

use super::{BackendMode, Notification, Notifications, ProgressBackend};

/// Owns the caught-set. Every mutation persists the full set through the
/// configured backend.
pub struct ProgressStore {
    caught: BTreeSet<u64>,
    total: usize,
    backend: Arc<dyn ProgressBackend>,
    pending_writes: Vec<JoinHandle<()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    /// The id was added. The UI celebrates the capture.
    Caught,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceSource {
    /// User supplied progress file. Persisted.
    Import,
    /// State read back from the backend. Not written back.
    Backend,
}

impl fmt::Display for ReplaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceSource::Import => write!(f, "import"),
            ReplaceSource::Backend => write!(f, "backend"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Replaced,
    /// The shared document was missing and has been created from the
    /// current state.
    Bootstrapped,
    Unchanged,
}

/// Proof that the user explicitly agreed to wipe the progress.
#[derive(Debug)]
pub struct ResetConfirmation(());

impl ResetConfirmation {
    pub fn from_user(confirmed: bool) -> Option<Self> {
        confirmed.then_some(ResetConfirmation(()))
    }
}

impl ProgressStore {
    /// `total` is the catalog size reported alongside shared snapshots.
    pub fn new(backend: Arc<dyn ProgressBackend>, total: usize) -> Self {
        ProgressStore {
            caught: BTreeSet::new(),
            total,
            backend,
            pending_writes: vec![],
        }
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    /// Loads the persisted state, if the backend has one to offer
    /// synchronously, and subscribes to external changes. A corrupted local
    /// state starts from empty progress.
    pub async fn initialize(&mut self) -> Result<Notifications, Status> {
        self.reload();
        self.backend.subscribe().await
    }

    /// Same as `initialize` but never fails: a broken subscription is logged
    /// and the session keeps running without external updates.
    pub async fn initialize_or_detach(&mut self) -> Notifications {
        match self.initialize().await {
            Ok(notifications) => notifications,
            Err(status) => {
                error!("Failed to subscribe to progress changes: {status}");
                mpsc::unbounded_channel().1
            }
        }
    }

    pub fn is_caught(&self, id: u64) -> bool {
        self.caught.contains(&id)
    }

    pub fn snapshot(&self) -> &BTreeSet<u64> {
        &self.caught
    }

    pub fn len(&self) -> usize {
        self.caught.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caught.is_empty()
    }

    pub fn toggle(&mut self, id: u64) -> Toggled {
        let toggled = match self.caught.remove(&id) {
            true => Toggled::Released,
            false => {
                self.caught.insert(id);
                Toggled::Caught
            }
        };

        log_event!(ProgressEvent::toggle(id, toggled == Toggled::Caught));
        self.persist();
        toggled
    }

    pub fn clear(&mut self, _confirmation: ResetConfirmation) {
        log_event!(ProgressEvent::reset(self.caught.len()));
        self.caught.clear();
        self.persist();
    }

    pub fn replace(&mut self, ids: impl IntoIterator<Item = u64>, source: ReplaceSource) {
        self.caught = ids.into_iter().collect();
        log_event!(ProgressEvent::replace(source, self.caught.len()));

        if source == ReplaceSource::Import {
            self.persist();
        }
    }

    /// Reconciles the in-memory set with a change reported by the backend.
    pub fn apply(&mut self, notification: Notification) -> Applied {
        match notification {
            Notification::Snapshot(progress) => match progress.caught_pokemon {
                Some(ids) => {
                    self.replace(ids, ReplaceSource::Backend);
                    info!("progress synchronized ({} caught)", self.caught.len());
                    Applied::Replaced
                }
                None => Applied::Unchanged,
            },
            Notification::Missing => {
                info!("creating shared progress document");
                log_event!(ProgressEvent::Bootstrap);
                self.persist();
                Applied::Bootstrapped
            }
            Notification::StorageChanged => {
                self.reload();
                Applied::Replaced
            }
            Notification::Failed(status) => {
                error!("Progress synchronization failed: {status}");
                Applied::Unchanged
            }
        }
    }

    /// Waits for in-flight backend writes and releases the subscription.
    pub async fn flush(&mut self) {
        for handle in self.pending_writes.drain(..) {
            if let Err(e) = handle.await {
                warn!("progress write task failed: {e}");
            }
        }
        self.backend.shutdown().await;
    }

    fn reload(&mut self) {
        match self.backend.load() {
            Ok(Some(ids)) => self.replace(ids, ReplaceSource::Backend),
            Ok(None) => {}
            Err(status) => {
                error!("Failed to load saved progress, starting empty: {status}");
                self.replace([], ReplaceSource::Backend);
            }
        }
    }

    fn persist(&mut self) {
        self.pending_writes.retain(|handle| !handle.is_finished());

        let ids = self.caught.iter().copied().collect();
        if let Some(handle) = self.backend.save(ids, self.total) {
            self.pending_writes.push(handle);
        }
    }
}
