use std::sync::Arc;

use async_trait::async_trait;
use firestore::{
    FirestoreDb, FirestoreListenEvent, FirestoreListener, FirestoreListenerTarget,
    FirestoreMemListenStateStorage,
};
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tracing::{error, instrument, warn};

use crate::{
    api::FirestoreApi, documents::SharedProgress, log_event, logging::FirestoreEvent, Status,
};

use super::{DocumentStore, Notification};

/// The `/shinyDex/shared-progress` Firestore document.
pub struct FirestoreDocument {
    firestore: Arc<FirestoreApi>,
    listener: Mutex<Option<FirestoreListener<FirestoreDb, FirestoreMemListenStateStorage>>>,
}

impl FirestoreDocument {
    pub fn new(firestore: Arc<FirestoreApi>) -> Self {
        FirestoreDocument {
            firestore,
            listener: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocument {
    #[instrument(name = "shared_progress::read", level = "trace", skip(self))]
    async fn read(&self) -> Result<Option<SharedProgress>, Status> {
        let doc = self
            .firestore
            .db()
            .fluent()
            .select()
            .by_id_in(COLLECTION)
            .obj()
            .one(DOC_ID)
            .await;

        match doc {
            Ok(Some(doc)) => {
                log_event!(FirestoreEvent::read(
                    COLLECTION.to_owned(),
                    DOC_ID.to_owned(),
                    None
                ));
                Ok(Some(doc))
            }
            Ok(None) => {
                log_event!(FirestoreEvent::read_not_found(
                    COLLECTION.to_owned(),
                    DOC_ID.to_owned()
                ));
                Ok(None)
            }
            Err(e) => {
                log_event!(FirestoreEvent::read(
                    COLLECTION.to_owned(),
                    DOC_ID.to_owned(),
                    Some(e.to_string())
                ));
                Err(e.into())
            }
        }
    }

    #[instrument(name = "shared_progress::write", level = "trace", skip(self, progress))]
    async fn write(&self, progress: &SharedProgress) -> Result<(), Status> {
        let result = self
            .firestore
            .db()
            .fluent()
            .update()
            .fields(FIELDS)
            .in_col(COLLECTION)
            .document_id(DOC_ID)
            .object(progress)
            .execute::<()>()
            .await;

        match result {
            Ok(()) => {
                log_event!(FirestoreEvent::write(
                    COLLECTION.to_owned(),
                    DOC_ID.to_owned(),
                    None
                ));
                Ok(())
            }
            Err(e) => {
                log_event!(FirestoreEvent::write(
                    COLLECTION.to_owned(),
                    DOC_ID.to_owned(),
                    Some(e.to_string())
                ));
                Err(e.into())
            }
        }
    }

    async fn listen(&self, notifications: UnboundedSender<Notification>) -> Result<(), Status> {
        let db = self.firestore.db();
        let mut listener = db
            .create_listener(FirestoreMemListenStateStorage::new())
            .await?;

        db.fluent()
            .select()
            .by_id_in(COLLECTION)
            .batch_listen([DOC_ID])
            .add_target(LISTENER_TARGET, &mut listener)?;

        listener
            .start(move |event| {
                let notifications = notifications.clone();
                async move {
                    match event {
                        FirestoreListenEvent::DocumentChange(change) => {
                            if let Some(doc) = change.document {
                                match FirestoreDb::deserialize_doc_to::<SharedProgress>(&doc) {
                                    Ok(progress) => {
                                        let _ = notifications.send(Notification::Snapshot(progress));
                                    }
                                    Err(e) => {
                                        error!("Shared progress snapshot failed to parse: {e}");
                                    }
                                }
                            }
                        }
                        FirestoreListenEvent::DocumentDelete(_) => {
                            warn!("shared progress document was deleted");
                            let _ = notifications.send(Notification::Missing);
                        }
                        _ => {}
                    }
                    Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
                }
            })
            .await?;

        log_event!(FirestoreEvent::listen(
            COLLECTION.to_owned(),
            DOC_ID.to_owned(),
            None
        ));
        *self.listener.lock().await = Some(listener);
        Ok(())
    }

    async fn stop(&self) {
        if let Some(mut listener) = self.listener.lock().await.take() {
            if let Err(e) = listener.shutdown().await {
                warn!("Failed to stop shared progress listener: {e}");
            }
        }
    }
}

const COLLECTION: &str = "shinyDex";
const DOC_ID: &str = "shared-progress";
const LISTENER_TARGET: FirestoreListenerTarget = FirestoreListenerTarget::new(17_u32);

/// Top-level fields replaced on every save. Other fields of the document are
/// preserved.
const FIELDS: [&str; 3] = ["caughtPokemon", "lastUpdate", "totalPokemon"];
