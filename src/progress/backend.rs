use async_trait::async_trait;
use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{documents::SharedProgress, Status};

/// Key of the caught-set in local storage.
pub const PROGRESS_KEY: &str = "shinyDexProgress";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Progress lives on this device only.
    Local,
    /// Progress is one document shared by every player.
    Shared,
}

/// Pushed by a backend when the persisted state changed outside this session.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Full snapshot of the shared document.
    Snapshot(SharedProgress),
    /// The shared document does not exist yet.
    Missing,
    /// Another tab wrote the progress key in local storage.
    StorageChanged,
    /// The subscription reported an error. No further updates are expected.
    Failed(Status),
}

pub type Notifications = mpsc::UnboundedReceiver<Notification>;

#[async_trait]
pub trait ProgressBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Reads the persisted caught ids synchronously. Backends that deliver
    /// their state through `subscribe` return `Ok(None)`.
    fn load(&self) -> Result<Option<Vec<u64>>, Status>;

    /// Persists the full caught-set. Asynchronous backends return the handle
    /// of the in-flight write.
    fn save(&self, ids: Vec<u64>, total: usize) -> Option<JoinHandle<()>>;

    /// Starts delivering external changes.
    async fn subscribe(&self) -> Result<Notifications, Status>;

    async fn shutdown(&self) {}
}

pub fn encode_ids(ids: &[u64]) -> Result<String, Status> {
    Ok(serde_json::to_string(ids)?)
}

pub fn decode_ids(value: &str) -> Result<Vec<u64>, Status> {
    serde_json::from_str(value).map_err(|e| {
        Status::invalid_argument(format!("Stored progress '{value}' failed to parse: {e}"))
    })
}
