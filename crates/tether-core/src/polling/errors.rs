use crate::errors::TetherError;
use crate::render::RenderError;

/// Failure inside a poll cycle that is not a transport problem.
///
/// Transport failures never surface here: they only flip connectivity.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Failed to render log update: {0}")]
    Render(#[from] RenderError),
}

impl TetherError for PollError {
    fn error_code(&self) -> &'static str {
        match self {
            PollError::Render(_) => "POLL_RENDER_FAILED",
        }
    }
}
