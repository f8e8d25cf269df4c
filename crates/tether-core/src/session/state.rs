use super::types::{LogCursor, SessionContext};

/// Client-side view of the backend conversation.
///
/// Owned by the poller. Context and cursor change together: switching the
/// context always resets the cursor, so a cursor never points into another
/// conversation's log.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    context: Option<SessionContext>,
    cursor: LogCursor,
    connected: bool,
    last_spoken_no: u64,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: SessionContext) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    pub fn cursor(&self) -> &LogCursor {
        &self.cursor
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_spoken_no(&self) -> u64 {
        self.last_spoken_no
    }

    /// Switch to `context`.
    ///
    /// Returns `false` without touching anything if it is already active.
    /// Otherwise resets the cursor and the speech sequence and returns `true`;
    /// the caller must then clear whatever it rendered for the old context.
    pub fn set_context(&mut self, context: SessionContext) -> bool {
        if self.context.as_ref() == Some(&context) {
            return false;
        }
        self.context = Some(context);
        self.cursor = LogCursor::default();
        self.last_spoken_no = 0;
        true
    }

    /// Adopt a new log stream, starting from version 0.
    pub fn reset_cursor(&mut self, guid: impl Into<String>) {
        self.cursor = LogCursor::new(guid, 0);
    }

    pub fn advance(&mut self, version: u64) {
        self.cursor.version = version;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn mark_spoken(&mut self, no: u64) {
        self.last_spoken_no = no;
    }
}
