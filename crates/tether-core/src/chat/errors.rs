use crate::errors::TetherError;
use crate::polling::PollError;
use crate::render::RenderError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("No active chat. Pass --context or start one with 'tether new'")]
    NoActiveContext,

    #[error("Backend did not return a chat context")]
    MissingContext,

    #[error("Backend disconnected, cannot restart")]
    Disconnected,

    #[error("Backend did not come back within {attempts} health checks")]
    RestartTimedOut { attempts: u32 },

    #[error("Backend returned no chat to save")]
    NothingExported,

    #[error("Backend loaded no chats")]
    NoChatsLoaded,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl TetherError for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            ChatError::EmptyMessage => "CHAT_EMPTY_MESSAGE",
            ChatError::NoActiveContext => "CHAT_NO_ACTIVE_CONTEXT",
            ChatError::MissingContext => "CHAT_MISSING_CONTEXT",
            ChatError::Disconnected => "CHAT_BACKEND_DISCONNECTED",
            ChatError::RestartTimedOut { .. } => "CHAT_RESTART_TIMED_OUT",
            ChatError::NothingExported => "CHAT_NOTHING_EXPORTED",
            ChatError::NoChatsLoaded => "CHAT_NO_CHATS_LOADED",
            ChatError::Transport(e) => e.error_code(),
            ChatError::Render(e) => e.error_code(),
            ChatError::Poll(e) => e.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            ChatError::EmptyMessage | ChatError::NoActiveContext | ChatError::Disconnected => true,
            ChatError::Transport(e) => e.is_user_error(),
            ChatError::MissingContext
            | ChatError::RestartTimedOut { .. }
            | ChatError::NothingExported
            | ChatError::NoChatsLoaded
            | ChatError::Render(_)
            | ChatError::Poll(_) => false,
        }
    }
}
