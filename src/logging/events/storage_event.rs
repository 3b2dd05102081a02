use serde::{Deserialize, Serialize};

/// Local key-value storage activity.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct StorageEvent {
    op: StorageOp,
    key: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StorageEvent {
    pub fn read(key: &str, error: Option<String>) -> Self {
        StorageEvent {
            op: StorageOp::Read,
            key: key.to_owned(),
            error,
        }
    }

    pub fn write(key: &str, error: Option<String>) -> Self {
        StorageEvent {
            op: StorageOp::Write,
            key: key.to_owned(),
            error,
        }
    }

    pub fn parse_failure(key: &str, error: String) -> Self {
        StorageEvent {
            op: StorageOp::Parse,
            key: key.to_owned(),
            error: Some(error),
        }
    }

    pub fn external_change(key: &str) -> Self {
        StorageEvent {
            op: StorageOp::ExternalChange,
            key: key.to_owned(),
            error: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
enum StorageOp {
    Read,
    Write,
    Parse,
    ExternalChange,
}
