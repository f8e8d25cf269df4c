use super::errors::RenderError;
use crate::protocol::{LogEntry, Progress};

/// Where the poller puts what it learns from the backend.
///
/// The backend resends the full log whenever the version moves, so
/// `apply_entries` must upsert by [`LogEntry::key`] rather than append.
pub trait LogSink: Send {
    /// Apply entries in the given order (oldest first).
    fn apply_entries(&mut self, entries: &[LogEntry]) -> Result<(), RenderError>;

    /// Drop everything rendered so far. Called on context switches and when
    /// the backend starts a new log stream.
    fn clear_log(&mut self) -> Result<(), RenderError>;

    fn set_connectivity(&mut self, connected: bool);

    fn update_progress(&mut self, progress: &Progress) -> Result<(), RenderError>;
}
