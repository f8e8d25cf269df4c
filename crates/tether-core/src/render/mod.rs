//! Rendering seam between the poller and whatever displays the log.

pub mod errors;
pub mod log_view;
pub mod traits;

pub use errors::RenderError;
pub use log_view::{LogView, UpsertOutcome};
pub use traits::LogSink;
