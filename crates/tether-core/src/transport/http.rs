//! JSON-over-HTTP implementation of [`Backend`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::errors::TransportError;
use super::traits::Backend;
use crate::config::BackendConfig;
use crate::protocol::endpoints;
use crate::protocol::{
    ContextRequest, CtxidRequest, ExportResponse, LoadChatsRequest, LoadChatsResponse,
    MessageRequest, MessageResponse, PauseRequest, PollRequest, PollResponse,
};

/// HTTP client for the agent backend.
///
/// Every request carries the configured timeout; expiry is reported as
/// [`TransportError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let base_url = config.url().trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TransportError::InvalidUrl { url: base_url });
        }

        let timeout = config.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            credentials: config
                .credentials()
                .map(|(user, password)| (user.to_string(), password.to_string())),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            TransportError::Request {
                message: error.to_string(),
            }
        }
    }

    /// POST a JSON body and return the raw response text of a 2xx answer.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, TransportError> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        debug!(
            event = "core.transport.response_received",
            path = path,
            status = status.as_u16(),
            bytes = text.len()
        );

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

/// Decode a JSON object body; an empty body yields the type's default.
fn parse_body<T: DeserializeOwned + Default>(text: &str) -> Result<T, TransportError> {
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(text).map_err(|e| TransportError::Decode {
        message: e.to_string(),
    })
}

/// JavaScript-style falsiness of a decoded body.
fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}

/// Decode a `/poll` body, mapping empty and falsy bodies to `None`.
pub fn parse_poll_body(text: &str) -> Result<Option<PollResponse>, TransportError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })?;
    if is_falsy(&value) {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn poll(&self, request: &PollRequest) -> Result<Option<PollResponse>, TransportError> {
        let text = self.post_json(endpoints::POLL, request).await?;
        parse_poll_body(&text)
    }

    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, TransportError> {
        let text = self.post_json(endpoints::MESSAGE_ASYNC, request).await?;
        parse_body(&text)
    }

    async fn pause(&self, request: &PauseRequest) -> Result<(), TransportError> {
        self.post_json(endpoints::PAUSE, request).await?;
        Ok(())
    }

    async fn reset_chat(&self, context: &str) -> Result<(), TransportError> {
        let body = ContextRequest {
            context: context.to_string(),
        };
        self.post_json(endpoints::CHAT_RESET, &body).await?;
        Ok(())
    }

    async fn remove_chat(&self, context: &str) -> Result<(), TransportError> {
        let body = ContextRequest {
            context: context.to_string(),
        };
        self.post_json(endpoints::CHAT_REMOVE, &body).await?;
        Ok(())
    }

    async fn nudge(&self, context: &str) -> Result<(), TransportError> {
        let body = CtxidRequest {
            ctxid: context.to_string(),
        };
        self.post_json(endpoints::NUDGE, &body).await?;
        Ok(())
    }

    async fn restart(&self) -> Result<(), TransportError> {
        self.post_json(endpoints::RESTART, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), TransportError> {
        self.post_json(endpoints::HEALTH, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn export_chat(&self, context: &str) -> Result<ExportResponse, TransportError> {
        let body = CtxidRequest {
            ctxid: context.to_string(),
        };
        let text = self.post_json(endpoints::CHAT_EXPORT, &body).await?;
        parse_body(&text)
    }

    async fn load_chats(&self, chats: &[String]) -> Result<LoadChatsResponse, TransportError> {
        let body = LoadChatsRequest {
            chats: chats.to_vec(),
        };
        let text = self.post_json(endpoints::CHAT_LOAD, &body).await?;
        parse_body(&text)
    }
}
