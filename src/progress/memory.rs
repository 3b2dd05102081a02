use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;

use crate::{documents::SharedProgress, Status};

use super::{DocumentStore, Notification};

/// Test fixture with the merge and listen semantics of the Firestore
/// document. Every store holding the same instance acts as a separate
/// client.
#[derive(Default)]
pub struct MemoryDocument {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    fields: Option<Map<String, Value>>,
    listeners: Vec<UnboundedSender<Notification>>,
    fail_writes: bool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        MemoryDocument::default()
    }

    /// A document that already exists with the given top-level fields.
    pub fn with_fields(fields: Map<String, Value>) -> Self {
        MemoryDocument {
            state: Mutex::new(State {
                fields: Some(fields),
                ..Default::default()
            }),
        }
    }

    /// Makes every following write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = fail;
        }
    }

    /// Raw top-level fields of the document.
    pub fn fields(&self) -> Option<Map<String, Value>> {
        self.state.lock().ok().and_then(|state| state.fields.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, Status> {
        self.state
            .lock()
            .map_err(|_| Status::internal("shared document lock poisoned"))
    }
}

fn parse(fields: &Map<String, Value>) -> Result<SharedProgress, Status> {
    Ok(serde_json::from_value(Value::Object(fields.clone()))?)
}

#[async_trait]
impl DocumentStore for MemoryDocument {
    async fn read(&self) -> Result<Option<SharedProgress>, Status> {
        let state = self.lock()?;
        state.fields.as_ref().map(parse).transpose()
    }

    async fn write(&self, progress: &SharedProgress) -> Result<(), Status> {
        let mut state = self.lock()?;
        if state.fail_writes {
            return Err(Status::internal("shared document is unavailable"));
        }

        let Value::Object(update) = serde_json::to_value(progress)? else {
            return Err(Status::internal("shared progress is not an object"));
        };
        let fields = state.fields.get_or_insert_with(Map::new);
        for (name, value) in update {
            fields.insert(name, value);
        }

        let snapshot = parse(fields)?;
        state
            .listeners
            .retain(|listener| listener.send(Notification::Snapshot(snapshot.clone())).is_ok());
        Ok(())
    }

    async fn listen(&self, notifications: UnboundedSender<Notification>) -> Result<(), Status> {
        self.lock()?.listeners.push(notifications);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn write_preserves_other_fields() {
        let Value::Object(fields) = json!({
            "caughtPokemon": [1, 2, 3],
            "challenge": "kanto",
        }) else {
            unreachable!()
        };
        let document = MemoryDocument::with_fields(fields);

        document
            .write(&SharedProgress::new(vec![2], 151))
            .await
            .unwrap();

        let fields = document.fields().unwrap();
        assert_eq!(fields["caughtPokemon"], json!([2]));
        assert_eq!(fields["challenge"], json!("kanto"));
        assert_eq!(fields["totalPokemon"], json!(151));
    }

    #[tokio::test]
    async fn failed_write_leaves_document_untouched() {
        let document = MemoryDocument::new();
        document.set_fail_writes(true);

        assert!(document
            .write(&SharedProgress::new(vec![2], 151))
            .await
            .is_err());
        assert_eq!(document.fields(), None);
    }
}
