use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext(String);

impl SessionContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh client-side context (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionContext {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionContext {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Position in a log stream: which stream, and the last applied version.
///
/// A different `guid` means a different stream; versions of two streams are
/// never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCursor {
    pub guid: String,
    pub version: u64,
}

impl LogCursor {
    pub fn new(guid: impl Into<String>, version: u64) -> Self {
        Self {
            guid: guid.into(),
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_contexts_are_unique_uuids() {
        let a = SessionContext::generate();
        let b = SessionContext::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_context_serializes_as_plain_string() {
        let ctx = SessionContext::new("ctx-1");
        assert_eq!(serde_json::to_string(&ctx).unwrap(), "\"ctx-1\"");
    }
}
