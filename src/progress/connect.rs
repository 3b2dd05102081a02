use std::sync::Arc;

use tracing::{info, warn};

use crate::{api::FirestoreApi, config::RemoteConfig};

use super::{FirestoreDocument, LocalBackend, LocalStorage, ProgressBackend, RemoteBackend};

/// Picks the shared backend when it is configured and reachable. Otherwise
/// progress stays on this device.
pub async fn open_backend(
    config: &RemoteConfig,
    storage: LocalStorage,
    local_only: bool,
) -> Arc<dyn ProgressBackend> {
    if local_only {
        info!("shared backend disabled, using local storage");
        return Arc::new(LocalBackend::new(storage));
    }
    if !config.is_configured() {
        info!("shared backend not configured, using local storage");
        return Arc::new(LocalBackend::new(storage));
    }

    match FirestoreApi::connect(&config.project_id).await {
        Ok(firestore) => {
            let document = FirestoreDocument::new(Arc::new(firestore));
            Arc::new(RemoteBackend::new(Arc::new(document), storage))
        }
        Err(status) => {
            warn!("Failed to connect to the shared backend, using local storage: {status}");
            Arc::new(LocalBackend::new(storage))
        }
    }
}
