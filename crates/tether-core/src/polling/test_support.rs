//! Scripted collaborators shared by the poller, scheduler and chat tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::protocol::{
    ExportResponse, LoadChatsResponse, LogEntry, MessageRequest, MessageResponse, PauseRequest,
    PollRequest, PollResponse, Progress,
};
use crate::render::{LogSink, LogView, RenderError};
use crate::speech::{SpeechError, Speaker};
use crate::transport::{Backend, TransportError};

pub fn entry(id: &str, no: u64, kind: &str, content: &str) -> LogEntry {
    LogEntry {
        id: Some(id.to_string()),
        no: Some(no),
        kind: kind.to_string(),
        content: content.to_string(),
        ..Default::default()
    }
}

pub fn response(context: &str, guid: &str, version: u64, logs: Vec<LogEntry>) -> PollResponse {
    PollResponse {
        context: Some(context.to_string()),
        log_guid: guid.to_string(),
        log_version: version,
        logs,
        ..Default::default()
    }
}

type PollReply = Result<Option<PollResponse>, TransportError>;

#[derive(Default)]
struct Script {
    polls: VecDeque<PollReply>,
    requests: Vec<PollRequest>,
    messages: Vec<MessageRequest>,
    message_reply: Option<MessageResponse>,
    pauses: Vec<PauseRequest>,
    resets: Vec<String>,
    removals: Vec<String>,
    nudges: Vec<String>,
    restart_fails: bool,
    restarts: usize,
    health_failures: usize,
    health_checks: usize,
    exports: Vec<String>,
    loaded: Vec<Vec<String>>,
    load_reply: Option<LoadChatsResponse>,
}

/// Backend answering polls from a queue; an exhausted queue answers with
/// an empty body.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: PollResponse) {
        self.script.lock().unwrap().polls.push_back(Ok(Some(response)));
    }

    pub fn push_empty(&self) {
        self.script.lock().unwrap().polls.push_back(Ok(None));
    }

    pub fn push_error(&self, error: TransportError) {
        self.script.lock().unwrap().polls.push_back(Err(error));
    }

    pub fn set_message_reply(&self, reply: MessageResponse) {
        self.script.lock().unwrap().message_reply = Some(reply);
    }

    /// Make `/restart` fail, then let `/health` fail `failures` times.
    pub fn script_restart(&self, failures: usize) {
        let mut script = self.script.lock().unwrap();
        script.restart_fails = true;
        script.health_failures = failures;
    }

    pub fn set_load_reply(&self, reply: LoadChatsResponse) {
        self.script.lock().unwrap().load_reply = Some(reply);
    }

    pub fn requests(&self) -> Vec<PollRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn messages(&self) -> Vec<MessageRequest> {
        self.script.lock().unwrap().messages.clone()
    }

    pub fn pauses(&self) -> Vec<PauseRequest> {
        self.script.lock().unwrap().pauses.clone()
    }

    pub fn resets(&self) -> Vec<String> {
        self.script.lock().unwrap().resets.clone()
    }

    pub fn removals(&self) -> Vec<String> {
        self.script.lock().unwrap().removals.clone()
    }

    pub fn nudges(&self) -> Vec<String> {
        self.script.lock().unwrap().nudges.clone()
    }

    pub fn restarts(&self) -> usize {
        self.script.lock().unwrap().restarts
    }

    pub fn health_checks(&self) -> usize {
        self.script.lock().unwrap().health_checks
    }

    pub fn exports(&self) -> Vec<String> {
        self.script.lock().unwrap().exports.clone()
    }

    pub fn loaded(&self) -> Vec<Vec<String>> {
        self.script.lock().unwrap().loaded.clone()
    }
}

fn connection_dropped() -> TransportError {
    TransportError::Request {
        message: "connection closed".to_string(),
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn poll(&self, request: &PollRequest) -> Result<Option<PollResponse>, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script.polls.pop_front().unwrap_or(Ok(None))
    }

    async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.messages.push(request.clone());
        Ok(script.message_reply.clone().unwrap_or(MessageResponse {
            message: Some("Message received.".to_string()),
            context: Some(request.context.clone()),
        }))
    }

    async fn pause(&self, request: &PauseRequest) -> Result<(), TransportError> {
        self.script.lock().unwrap().pauses.push(request.clone());
        Ok(())
    }

    async fn reset_chat(&self, context: &str) -> Result<(), TransportError> {
        self.script.lock().unwrap().resets.push(context.to_string());
        Ok(())
    }

    async fn remove_chat(&self, context: &str) -> Result<(), TransportError> {
        self.script.lock().unwrap().removals.push(context.to_string());
        Ok(())
    }

    async fn nudge(&self, context: &str) -> Result<(), TransportError> {
        self.script.lock().unwrap().nudges.push(context.to_string());
        Ok(())
    }

    async fn restart(&self) -> Result<(), TransportError> {
        let mut script = self.script.lock().unwrap();
        script.restarts += 1;
        if script.restart_fails {
            return Err(connection_dropped());
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), TransportError> {
        let mut script = self.script.lock().unwrap();
        script.health_checks += 1;
        if script.health_failures > 0 {
            script.health_failures -= 1;
            return Err(connection_dropped());
        }
        Ok(())
    }

    async fn export_chat(&self, context: &str) -> Result<ExportResponse, TransportError> {
        self.script.lock().unwrap().exports.push(context.to_string());
        Ok(ExportResponse {
            ctxid: context.to_string(),
            content: format!("{{\"id\":\"{context}\"}}"),
        })
    }

    async fn load_chats(&self, chats: &[String]) -> Result<LoadChatsResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.loaded.push(chats.to_vec());
        Ok(script.load_reply.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Apply(usize),
    Clear,
    Connectivity(bool),
    Progress(Progress),
}

/// [`LogView`] that also records the order of calls.
#[derive(Default)]
pub struct RecordingSink {
    pub view: LogView,
    pub events: Vec<SinkEvent>,
}

impl LogSink for RecordingSink {
    fn apply_entries(&mut self, entries: &[LogEntry]) -> Result<(), RenderError> {
        self.events.push(SinkEvent::Apply(entries.len()));
        self.view.apply_entries(entries)
    }

    fn clear_log(&mut self) -> Result<(), RenderError> {
        self.events.push(SinkEvent::Clear);
        self.view.clear_log()
    }

    fn set_connectivity(&mut self, connected: bool) {
        self.events.push(SinkEvent::Connectivity(connected));
        self.view.set_connectivity(connected);
    }

    fn update_progress(&mut self, progress: &Progress) -> Result<(), RenderError> {
        self.events.push(SinkEvent::Progress(progress.clone()));
        self.view.update_progress(progress)
    }
}

/// Sink whose every write fails.
pub struct FailingSink;

impl LogSink for FailingSink {
    fn apply_entries(&mut self, _entries: &[LogEntry]) -> Result<(), RenderError> {
        Err(RenderError::Rejected {
            message: "display detached".to_string(),
        })
    }

    fn clear_log(&mut self) -> Result<(), RenderError> {
        Err(RenderError::Rejected {
            message: "display detached".to_string(),
        })
    }

    fn set_connectivity(&mut self, _connected: bool) {}

    fn update_progress(&mut self, _progress: &Progress) -> Result<(), RenderError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    stops: Arc<Mutex<usize>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        *self.stops.lock().unwrap() += 1;
    }
}
