use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /poll`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollRequest {
    /// Last log version this client has applied.
    pub log_from: u64,
    /// Active conversation, `null` before one is known.
    pub context: Option<String>,
    /// IANA timezone of the caller.
    pub timezone: String,
}

/// Successful `/poll` response.
///
/// The backend resends the complete log of the context whenever
/// `log_version` moves; consumers upsert entries by [`LogEntry::key`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_guid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_version: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_progress: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_progress_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<LogEntry>,
    /// Chats known to the backend.
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<ContextSummary>,
    /// Scheduled tasks known to the backend. Tasks are contexts too.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<ContextSummary>,
    /// Whether the agent of the active context is paused.
    #[serde(default, deserialize_with = "null_as_default")]
    pub paused: bool,
}

impl PollResponse {
    pub fn progress(&self) -> Progress {
        Progress {
            message: self.log_progress.clone(),
            active: self.log_progress_active,
        }
    }
}

/// One entry of the conversational log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sequence number within the log stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<u64>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Temporary entries are replaced by a later version with the same key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub temp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kvps: Option<serde_json::Value>,
}

/// Identity of a log entry: its `id` when present and non-empty, else `no`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Id(String),
    No(u64),
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Id(id) => write!(f, "{}", id),
            EntryKey::No(no) => write!(f, "#{}", no),
        }
    }
}

impl LogEntry {
    pub fn key(&self) -> Option<EntryKey> {
        match (&self.id, self.no) {
            (Some(id), _) if !id.is_empty() => Some(EntryKey::Id(id.clone())),
            (_, Some(no)) => Some(EntryKey::No(no)),
            _ => None,
        }
    }

    pub fn is_response(&self) -> bool {
        self.kind == "response"
    }
}

/// A chat or task listed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Progress line shown while the agent works.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub message: String,
    pub active: bool,
}

/// Body of `POST /message_async`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub text: String,
    pub context: String,
    pub message_id: String,
}

/// Response of `POST /message_async`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Body of `POST /pause`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseRequest {
    pub paused: bool,
    pub context: String,
}

/// Body of `POST /chat_reset` and `POST /chat_remove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub context: String,
}

/// Body of `POST /nudge` and `POST /chat_export`, which name the chat `ctxid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtxidRequest {
    pub ctxid: String,
}

/// Response of `POST /chat_export`.
///
/// `content` is the serialized chat, ready to be written to disk and later
/// passed back to `/chat_load`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ctxid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// Body of `POST /chat_load`: one exported chat per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadChatsRequest {
    pub chats: Vec<String>,
}

/// Response of `POST /chat_load`, the contexts created for the loaded chats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadChatsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ctxids: Vec<String>,
}
