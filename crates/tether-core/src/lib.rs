//! tether-core: adaptive log-polling client for chat-style agent backends
//!
//! Keeps a near-real-time local copy of the conversation log the backend
//! produces for the active chat, polling fast right after activity and
//! slowly when idle. Used by the `tether` CLI.
//!
//! # Main Entry Points
//!
//! - [`polling`] - One poll cycle ([`Poller::poll`]) and the adaptive loop ([`run_polling`])
//! - [`chat`] - Chat operations (new, send, reset, remove, pause, nudge, save, load) and backend restart
//! - [`transport`] - The [`Backend`] seam and its HTTP implementation
//! - [`render`] - The [`LogSink`] seam and the id-keyed [`LogView`]
//! - [`config`] - Configuration management

pub mod chat;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod polling;
pub mod preferences;
pub mod protocol;
pub mod render;
pub mod session;
pub mod speech;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use chat::{ChatError, RestartOutcome};
pub use config::TetherConfig;
pub use errors::TetherError;
pub use polling::{Backoff, PollError, Poller, PollingSummary, SharedPoller, run_polling};
pub use preferences::PreferenceStore;
pub use protocol::{ContextSummary, EntryKey, LogEntry, PollRequest, PollResponse, Progress};
pub use render::{LogSink, LogView, RenderError, UpsertOutcome};
pub use session::{ClientState, LogCursor, SessionContext};
pub use speech::{CommandSpeaker, Speaker, SpeechError};
pub use transport::{Backend, HttpBackend, TransportError};

// Re-export logging initialization
pub use logging::init_logging;
