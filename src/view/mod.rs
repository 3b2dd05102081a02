//! Pure projections of (catalog, caught-set, criteria) into markup.

mod filter;
mod page;
mod render;
mod stats;

pub use filter::*;
pub use page::{page, reset_done_message, reset_prompt};
pub use render::*;
pub use stats::*;
