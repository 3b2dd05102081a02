use std::fmt::Debug;

use serde::Serialize;

use super::LogEvent;

#[derive(Serialize, Default, Clone, Debug)]
pub struct EventSpan {
    pub name: &'static str,

    pub latency: u64,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<LogEvent>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EventSpan>,
}

impl EventSpan {
    pub fn new(name: &'static str) -> Self {
        EventSpan {
            name,
            ..Default::default()
        }
    }

    /// True if neither this span nor any of its children recorded an event.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.children.iter().all(|child| child.is_empty())
    }
}
