use crate::errors::TetherError;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("No text-to-speech command found. Tried: {tried}")]
    NoCommand { tried: String },

    #[error("Text-to-speech command is empty")]
    EmptyCommand,

    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },
}

impl TetherError for SpeechError {
    fn error_code(&self) -> &'static str {
        match self {
            SpeechError::NoCommand { .. } => "SPEECH_NO_COMMAND",
            SpeechError::EmptyCommand => "SPEECH_EMPTY_COMMAND",
            SpeechError::SpawnFailed { .. } => "SPEECH_SPAWN_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            SpeechError::NoCommand { .. } | SpeechError::EmptyCommand
        )
    }
}
