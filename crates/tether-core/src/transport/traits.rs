use async_trait::async_trait;

use super::errors::TransportError;
use crate::protocol::{
    ExportResponse, LoadChatsResponse, MessageRequest, MessageResponse, PauseRequest, PollRequest,
    PollResponse,
};

/// The agent backend as seen by the client.
///
/// Implemented over HTTP by [`super::HttpBackend`]; tests substitute scripted
/// fakes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask for the log of the requested context.
    ///
    /// `Ok(None)` means the backend answered with an empty or falsy body.
    async fn poll(&self, request: &PollRequest) -> Result<Option<PollResponse>, TransportError>;

    /// Queue a user message for the agent.
    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, TransportError>;

    async fn pause(&self, request: &PauseRequest) -> Result<(), TransportError>;

    /// Clear the history of a chat, keeping the chat itself.
    async fn reset_chat(&self, context: &str) -> Result<(), TransportError>;

    async fn remove_chat(&self, context: &str) -> Result<(), TransportError>;

    /// Wake the agent of `context` when it looks stuck.
    async fn nudge(&self, context: &str) -> Result<(), TransportError>;

    /// Ask the backend process to restart itself.
    ///
    /// The process usually dies before answering, so an error here is
    /// expected.
    async fn restart(&self) -> Result<(), TransportError>;

    /// Liveness check; `Ok` once the backend answers.
    async fn health(&self) -> Result<(), TransportError>;

    async fn export_chat(&self, context: &str) -> Result<ExportResponse, TransportError>;

    /// Recreate chats from exported files, returning their new contexts.
    async fn load_chats(&self, chats: &[String]) -> Result<LoadChatsResponse, TransportError>;
}
