use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::{documents::SharedProgress, Status};

use super::Notification;

/// The single remote document holding the shared progress.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Returns `None` if the document was not created yet.
    async fn read(&self) -> Result<Option<SharedProgress>, Status>;

    /// Merges the fields of `progress` into the document, creating it if
    /// needed. Fields not present in `SharedProgress` are left untouched.
    async fn write(&self, progress: &SharedProgress) -> Result<(), Status>;

    /// Forwards every subsequent change of the document to `notifications`.
    async fn listen(&self, notifications: UnboundedSender<Notification>) -> Result<(), Status>;

    async fn stop(&self) {}
}
