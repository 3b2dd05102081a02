use serde::{Deserialize, Serialize};

use crate::{
    session::ShortcutAction,
    view::{Stats, StatusFilter},
};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Search {
    #[serde(default)]
    pub query: String,
}

/// Only the provided criteria change.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Filter {
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub status: Option<StatusFilter>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Reset {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Toggled {
    pub id: u64,
    pub caught: bool,
    pub celebrate: bool,
    pub stats: Stats,
}

#[derive(Clone, Debug, Serialize)]
pub struct Message {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Imported {
    pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Shortcut {
    pub action: ShortcutAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Error {
    pub error: String,
}
