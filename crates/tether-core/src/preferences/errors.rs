use crate::errors::TetherError;

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("Failed to save preferences: {message}")]
    SaveFailed { message: String },

    #[error("Failed to read preferences file '{path}': {message}")]
    ReadFailed { path: String, message: String },

    #[error("Preferences file '{path}' is not valid JSON ({message}); fix or delete it")]
    Corrupt { path: String, message: String },
}

impl TetherError for PreferenceError {
    fn error_code(&self) -> &'static str {
        match self {
            PreferenceError::SaveFailed { .. } => "PREFERENCES_SAVE_FAILED",
            PreferenceError::ReadFailed { .. } => "PREFERENCES_READ_FAILED",
            PreferenceError::Corrupt { .. } => "PREFERENCES_CORRUPT",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, PreferenceError::Corrupt { .. })
    }
}
