//! User-driven chat operations.
//!
//! Every operation that changes the active chat goes through
//! [`Poller::switch_context`], so the cursor reset and the renderer clear
//! always happen together.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::errors::ChatError;
use crate::polling::Poller;
use crate::protocol::{ExportResponse, LogEntry, MessageRequest, PauseRequest};
use crate::render::LogSink;
use crate::session::SessionContext;
use crate::transport::Backend;

/// Health checks made while waiting for a restarting backend.
pub const RESTART_HEALTH_ATTEMPTS: u32 = 240;

/// Pause after each failed health check.
pub const RESTART_HEALTH_INTERVAL: Duration = Duration::from_millis(250);

/// How a restart request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The backend answered `/restart` itself.
    Acknowledged,
    /// The connection dropped and `/health` answered on the given check.
    CameBack { attempts: u32 },
}

impl<B: Backend, S: LogSink> Poller<B, S> {
    fn remember_selection(&self, context: &SessionContext) {
        if let Some(prefs) = &self.preferences
            && let Err(e) = prefs.set_last_selected_chat(context.as_str())
        {
            warn!(
                event = "core.chat.remember_selection_failed",
                context = %context,
                error = %e
            );
        }
    }

    fn active_or(&self, context: Option<&SessionContext>) -> Result<SessionContext, ChatError> {
        context
            .or(self.state.context())
            .cloned()
            .ok_or(ChatError::NoActiveContext)
    }

    /// Start a fresh client-side chat and make it active.
    pub fn new_chat(&mut self) -> Result<SessionContext, ChatError> {
        let context = SessionContext::generate();
        self.switch_context(context.clone())?;
        self.remember_selection(&context);

        info!(event = "core.chat.new_completed", context = %context);
        Ok(context)
    }

    /// Make `context` active and fetch its log right away.
    ///
    /// Returns `false` if it already was active.
    pub async fn select_chat(&mut self, context: SessionContext) -> Result<bool, ChatError> {
        if !self.switch_context(context.clone())? {
            return Ok(false);
        }
        self.remember_selection(&context);
        self.poll().await?;

        info!(event = "core.chat.select_completed", context = %context);
        Ok(true)
    }

    /// Send a user message to the active chat (a new one if none is active).
    ///
    /// The message is rendered locally before the request goes out. The
    /// context returned by the backend becomes the active one.
    pub async fn send_message(&mut self, text: &str) -> Result<SessionContext, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let context = match self.state.context() {
            Some(context) => context.clone(),
            None => {
                let context = SessionContext::generate();
                self.switch_context(context.clone())?;
                context
            }
        };

        let message_id = uuid::Uuid::new_v4().to_string();
        info!(
            event = "core.chat.send_started",
            context = %context,
            message_id = %message_id
        );

        self.sink.apply_entries(&[LogEntry {
            id: Some(message_id.clone()),
            kind: "user".to_string(),
            content: text.to_string(),
            ..Default::default()
        }])?;

        let response = self
            .backend
            .send_message(&MessageRequest {
                text: text.to_string(),
                context: context.to_string(),
                message_id: message_id.clone(),
            })
            .await?;

        let returned = response
            .context
            .filter(|c| !c.is_empty())
            .map(SessionContext::new)
            .ok_or(ChatError::MissingContext)?;
        self.switch_context(returned.clone())?;

        info!(
            event = "core.chat.send_completed",
            context = %returned,
            message_id = %message_id
        );
        Ok(returned)
    }

    /// Clear the history of `context` (the active chat by default).
    pub async fn reset_chat(
        &mut self,
        context: Option<&SessionContext>,
    ) -> Result<SessionContext, ChatError> {
        let target = self.active_or(context)?;
        self.backend.reset_chat(target.as_str()).await?;

        info!(event = "core.chat.reset_completed", context = %target);
        Ok(target)
    }

    /// Delete `context` on the backend.
    ///
    /// When it is the active chat, another known chat (or a fresh one)
    /// becomes active first. Returns the chat that is active afterwards.
    pub async fn remove_chat(
        &mut self,
        context: &SessionContext,
    ) -> Result<Option<SessionContext>, ChatError> {
        if self.state.context() == Some(context) {
            let alternate = self
                .chats
                .iter()
                .find(|c| c.id != context.as_str())
                .map(|c| SessionContext::new(c.id.clone()))
                .unwrap_or_else(SessionContext::generate);
            self.switch_context(alternate.clone())?;
            self.remember_selection(&alternate);
        }

        self.backend.remove_chat(context.as_str()).await?;
        self.chats.retain(|c| c.id != context.as_str());

        info!(event = "core.chat.remove_completed", context = %context);
        Ok(self.state.context().cloned())
    }

    /// Pause or resume the agent working on the active chat.
    pub async fn pause_agent(&mut self, paused: bool) -> Result<(), ChatError> {
        let context = self.active_or(None)?;
        self.backend
            .pause(&PauseRequest {
                paused,
                context: context.to_string(),
            })
            .await?;
        self.paused = paused;

        info!(
            event = "core.chat.pause_completed",
            context = %context,
            paused = paused
        );
        Ok(())
    }

    /// Poke the agent of `context` (the active chat by default).
    pub async fn nudge_agent(
        &mut self,
        context: Option<&SessionContext>,
    ) -> Result<SessionContext, ChatError> {
        let target = self.active_or(context)?;
        self.backend.nudge(target.as_str()).await?;

        info!(event = "core.chat.nudge_completed", context = %target);
        Ok(target)
    }

    /// Restart the backend process and wait for it to answer again.
    ///
    /// Only allowed while the last poll reached the backend. A failed
    /// `/restart` means the process went down; `/health` is then retried up
    /// to `attempts` times, sleeping `interval` after each failure.
    pub async fn restart_backend(
        &mut self,
        attempts: u32,
        interval: Duration,
    ) -> Result<RestartOutcome, ChatError> {
        if !self.is_connected() {
            return Err(ChatError::Disconnected);
        }

        info!(event = "core.chat.restart_started");
        if self.backend.restart().await.is_ok() {
            info!(event = "core.chat.restart_completed", acknowledged = true);
            return Ok(RestartOutcome::Acknowledged);
        }

        for attempt in 1..=attempts {
            match self.backend.health().await {
                Ok(()) => {
                    info!(event = "core.chat.restart_completed", attempts = attempt);
                    return Ok(RestartOutcome::CameBack { attempts: attempt });
                }
                Err(e) => {
                    debug!(
                        event = "core.chat.restart_health_failed",
                        attempt = attempt,
                        error = %e
                    );
                    tokio::time::sleep(interval).await;
                }
            }
        }

        self.set_connectivity(false);
        warn!(event = "core.chat.restart_timed_out", attempts = attempts);
        Err(ChatError::RestartTimedOut { attempts })
    }

    /// Export `context` (the active chat by default) in the backend's chat
    /// file format.
    pub async fn export_chat(
        &mut self,
        context: Option<&SessionContext>,
    ) -> Result<ExportResponse, ChatError> {
        let target = self.active_or(context)?;
        let mut export = self.backend.export_chat(target.as_str()).await?;
        if export.content.is_empty() {
            return Err(ChatError::NothingExported);
        }
        if export.ctxid.is_empty() {
            export.ctxid = target.to_string();
        }

        info!(
            event = "core.chat.export_completed",
            context = %export.ctxid,
            bytes = export.content.len()
        );
        Ok(export)
    }

    /// Load exported chats and make the first one active.
    pub async fn load_chats(
        &mut self,
        chats: Vec<String>,
    ) -> Result<Vec<SessionContext>, ChatError> {
        let loaded: Vec<SessionContext> = self
            .backend
            .load_chats(&chats)
            .await?
            .ctxids
            .into_iter()
            .filter(|id| !id.is_empty())
            .map(SessionContext::new)
            .collect();

        let Some(first) = loaded.first() else {
            return Err(ChatError::NoChatsLoaded);
        };
        self.switch_context(first.clone())?;
        self.remember_selection(first);

        info!(
            event = "core.chat.load_completed",
            count = loaded.len(),
            context = %first
        );
        Ok(loaded)
    }
}
