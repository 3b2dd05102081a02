mod firestore_event;
mod progress_event;
mod storage_event;

pub use firestore_event::*;
pub use progress_event::*;
pub use storage_event::*;
