#![recursion_limit = "256"]

pub mod api;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod http;
pub mod logging;
pub mod progress;
pub mod session;
pub mod view;

mod status;
pub use status::Status;

mod tracing;
pub use crate::tracing::Tracing;
