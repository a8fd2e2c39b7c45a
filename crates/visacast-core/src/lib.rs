pub mod config;
pub mod frame;

pub use config::Settings;
pub use frame::{FrameError, documents_to_batch, row_from_fields};
