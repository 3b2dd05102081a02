use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{FirestoreEvent, ProgressEvent, StorageEvent};

/// Structured event attached to the enclosing log span by `DexLogsLayer`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub enum LogEvent {
    Firestore(FirestoreEvent),
    Storage(StorageEvent),
    Progress(ProgressEvent),
}

impl LogEvent {
    pub fn encode(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                warn!("{}", e);
                String::default()
            }
        }
    }
}

impl From<FirestoreEvent> for LogEvent {
    fn from(event: FirestoreEvent) -> Self {
        LogEvent::Firestore(event)
    }
}

impl From<StorageEvent> for LogEvent {
    fn from(event: StorageEvent) -> Self {
        LogEvent::Storage(event)
    }
}

impl From<ProgressEvent> for LogEvent {
    fn from(event: ProgressEvent) -> Self {
        LogEvent::Progress(event)
    }
}

#[macro_export]
macro_rules! log_event {
    ($event:expr) => {
        ::tracing::debug!(event = $crate::logging::LogEvent::from($event).encode())
    };
}
