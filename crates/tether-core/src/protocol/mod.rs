//! Wire types exchanged with the agent backend.
//!
//! All requests are JSON `POST` bodies; responses are JSON objects. Unknown
//! fields are ignored and `null` is accepted wherever a default makes sense.

pub mod types;

pub use types::{
    ContextRequest, ContextSummary, CtxidRequest, EntryKey, ExportResponse, LoadChatsRequest,
    LoadChatsResponse, LogEntry, MessageRequest, MessageResponse, PauseRequest, PollRequest,
    PollResponse, Progress,
};

/// Endpoint paths, relative to the backend base URL.
pub mod endpoints {
    pub const POLL: &str = "/poll";
    pub const MESSAGE_ASYNC: &str = "/message_async";
    pub const PAUSE: &str = "/pause";
    pub const CHAT_RESET: &str = "/chat_reset";
    pub const CHAT_REMOVE: &str = "/chat_remove";
    pub const CHAT_EXPORT: &str = "/chat_export";
    pub const CHAT_LOAD: &str = "/chat_load";
    pub const NUDGE: &str = "/nudge";
    pub const RESTART: &str = "/restart";
    pub const HEALTH: &str = "/health";
}
