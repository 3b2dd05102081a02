mod dex_layer;
mod event_span;
mod events;
mod log_event;

pub use dex_layer::DexLogsLayer;
pub use event_span::*;
pub use events::*;
pub use log_event::*;
