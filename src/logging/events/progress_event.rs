use serde::{Deserialize, Serialize};

/// State transitions of the caught-set.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub enum ProgressEvent {
    Toggle { id: u64, caught: bool },
    Reset { released: usize },
    Replace { source: String, size: usize },
    Bootstrap,
}

impl ProgressEvent {
    pub fn toggle(id: u64, caught: bool) -> Self {
        ProgressEvent::Toggle { id, caught }
    }

    pub fn reset(released: usize) -> Self {
        ProgressEvent::Reset { released }
    }

    pub fn replace(source: impl ToString, size: usize) -> Self {
        ProgressEvent::Replace {
            source: source.to_string(),
            size,
        }
    }
}
