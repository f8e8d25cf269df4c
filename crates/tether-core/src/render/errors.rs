use crate::errors::TetherError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer rejected update: {message}")]
    Rejected { message: String },
}

impl TetherError for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            RenderError::Io(_) => "RENDER_IO_ERROR",
            RenderError::Rejected { .. } => "RENDER_REJECTED",
        }
    }
}
