mod pokemon;
mod shared_progress;
mod transfer;

pub use pokemon::Pokemon;
pub use shared_progress::SharedProgress;
pub use transfer::{ExportFile, ImportFile};
