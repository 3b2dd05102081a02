use std::fmt::Debug;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct FirestoreEvent {
    op: Op,
    collection: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    doc: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl FirestoreEvent {
    pub fn read(collection: String, doc: String, error: Option<String>) -> Self {
        FirestoreEvent {
            op: Op::Read { not_found: false },
            collection,
            doc: Some(doc),
            errors: error.into_iter().collect(),
        }
    }

    pub fn read_not_found(collection: String, doc: String) -> Self {
        FirestoreEvent {
            op: Op::Read { not_found: true },
            collection,
            doc: Some(doc),
            errors: vec![],
        }
    }

    pub fn write(collection: String, doc: String, error: Option<String>) -> Self {
        FirestoreEvent {
            op: Op::Write,
            collection,
            doc: Some(doc),
            errors: error.into_iter().collect(),
        }
    }

    pub fn listen(collection: String, doc: String, error: Option<String>) -> Self {
        FirestoreEvent {
            op: Op::Listen,
            collection,
            doc: Some(doc),
            errors: error.into_iter().collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
enum Op {
    Read {
        #[serde(default)]
        #[serde(skip_serializing_if = "is_false")]
        not_found: bool,
    },
    Write,
    Listen,
}

fn is_false(value: &bool) -> bool {
    !*value
}
