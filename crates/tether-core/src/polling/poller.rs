use tracing::{debug, info, warn};

use super::errors::PollError;
use crate::preferences::PreferenceStore;
use crate::protocol::{ContextSummary, LogEntry, PollRequest};
use crate::render::{LogSink, RenderError};
use crate::session::{ClientState, SessionContext};
use crate::speech::{Speaker, next_utterance};
use crate::transport::Backend;

/// Keeps a local view of the backend log for one active context.
///
/// The poller is the only writer of the client state; context switches go
/// through [`Poller::switch_context`], which clears the renderer whenever
/// the cursor is reset.
pub struct Poller<B, S> {
    pub(crate) backend: B,
    pub(crate) sink: S,
    speaker: Option<Box<dyn Speaker>>,
    pub(crate) preferences: Option<PreferenceStore>,
    pub(crate) state: ClientState,
    timezone: String,
    pub(crate) chats: Vec<ContextSummary>,
    tasks: Vec<ContextSummary>,
    pub(crate) paused: bool,
}

impl<B: Backend, S: LogSink> Poller<B, S> {
    pub fn new(backend: B, sink: S, timezone: impl Into<String>) -> Self {
        Self {
            backend,
            sink,
            speaker: None,
            preferences: None,
            state: ClientState::new(),
            timezone: timezone.into(),
            chats: Vec::new(),
            tasks: Vec::new(),
            paused: false,
        }
    }

    /// Start with `context` already active instead of discovering one.
    pub fn with_context(mut self, context: SessionContext) -> Self {
        self.state = ClientState::with_context(context);
        self
    }

    /// Persisted preferences: gate speech and remember the selected chat.
    pub fn with_preferences(mut self, preferences: PreferenceStore) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.state.context()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Chats listed by the last accepted poll response.
    pub fn chats(&self) -> &[ContextSummary] {
        &self.chats
    }

    /// Tasks listed by the last accepted poll response.
    pub fn tasks(&self) -> &[ContextSummary] {
        &self.tasks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Make `context` the active one, clearing the rendered log if it changed.
    ///
    /// Returns whether a switch happened.
    pub fn switch_context(&mut self, context: SessionContext) -> Result<bool, RenderError> {
        let previous = self.state.context().cloned();
        if !self.state.set_context(context) {
            return Ok(false);
        }
        self.sink.clear_log()?;

        info!(
            event = "core.session.context_switched",
            from = previous.as_ref().map(|c| c.as_str()).unwrap_or(""),
            to = self.state.context().map(|c| c.as_str()).unwrap_or("")
        );
        Ok(true)
    }

    /// Run one poll cycle.
    ///
    /// Returns `Ok(true)` when new log content was applied. Transport
    /// failures and empty bodies mark the backend unreachable and return
    /// `Ok(false)`; stale responses for another context are dropped.
    /// `Err` only carries renderer failures.
    pub async fn poll(&mut self) -> Result<bool, PollError> {
        let request = PollRequest {
            log_from: self.state.cursor().version,
            context: self.state.context().map(|c| c.to_string()),
            timezone: self.timezone.clone(),
        };

        let mut response = match self.backend.poll(&request).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                debug!(event = "core.poll.empty_response");
                self.set_connectivity(false);
                return Ok(false);
            }
            Err(e) => {
                debug!(event = "core.poll.request_failed", error = %e);
                self.set_connectivity(false);
                return Ok(false);
            }
        };

        self.set_connectivity(true);

        if self.state.context().is_none()
            && let Some(remote) = response.context.as_deref().filter(|c| !c.is_empty())
        {
            info!(event = "core.poll.context_discovered", context = remote);
            self.switch_context(SessionContext::new(remote))?;
        }

        let is_current = match (response.context.as_deref(), self.state.context()) {
            (Some(remote), Some(local)) => remote == local.as_str(),
            _ => false,
        };
        if !is_current {
            debug!(
                event = "core.poll.stale_response_dropped",
                remote = response.context.as_deref().unwrap_or(""),
                local = self.state.context().map(|c| c.as_str()).unwrap_or("")
            );
            return Ok(false);
        }

        self.chats = std::mem::take(&mut response.contexts);
        self.tasks = std::mem::take(&mut response.tasks);
        self.paused = response.paused;

        if self.state.cursor().guid != response.log_guid {
            info!(
                event = "core.poll.log_stream_changed",
                previous_guid = %self.state.cursor().guid,
                guid = %response.log_guid
            );
            self.sink.clear_log()?;
            self.state.reset_cursor(response.log_guid.clone());
        }

        if self.state.cursor().version == response.log_version {
            return Ok(false);
        }

        self.sink.apply_entries(&response.logs)?;
        self.speak_latest(&response.logs);
        self.state.advance(response.log_version);
        self.sink.update_progress(&response.progress())?;

        debug!(
            event = "core.poll.log_applied",
            version = response.log_version,
            entries = response.logs.len()
        );

        Ok(true)
    }

    /// Silence any utterance still playing.
    pub fn stop_speech(&mut self) {
        if let Some(speaker) = self.speaker.as_mut() {
            speaker.stop();
        }
    }

    pub(crate) fn set_connectivity(&mut self, connected: bool) {
        if self.state.is_connected() != connected {
            if connected {
                info!(event = "core.poll.backend_reachable");
            } else {
                warn!(event = "core.poll.backend_unreachable");
            }
        }
        self.state.set_connected(connected);
        self.sink.set_connectivity(connected);
    }

    fn speak_latest(&mut self, entries: &[LogEntry]) {
        let Some(speaker) = self.speaker.as_mut() else {
            return;
        };
        let enabled = self
            .preferences
            .as_ref()
            .is_some_and(|prefs| prefs.speech_enabled());
        if !enabled {
            speaker.stop();
            return;
        }

        let Some((no, text)) = next_utterance(entries, self.state.last_spoken_no()) else {
            return;
        };
        self.state.mark_spoken(no);

        if let Err(e) = speaker.speak(text) {
            warn!(event = "core.speech.failed", no = no, error = %e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polling::test_support::{
        FailingSink, RecordingSink, RecordingSpeaker, ScriptedBackend, SinkEvent, entry, response,
    };
    use crate::session::LogCursor;
    use crate::transport::TransportError;

    fn poller_at(
        backend: ScriptedBackend,
        context: &str,
        guid: &str,
        version: u64,
    ) -> Poller<ScriptedBackend, RecordingSink> {
        let mut poller =
            Poller::new(backend, RecordingSink::default(), "UTC").with_context(context.into());
        poller.state.reset_cursor(guid);
        poller.state.advance(version);
        poller
    }

    #[tokio::test]
    async fn test_unchanged_version_is_no_update() {
        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g1", 5, vec![entry("m1", 1, "response", "hi")]));
        let mut poller = poller_at(backend.clone(), "c1", "g1", 5);

        assert!(!poller.poll().await.unwrap());

        assert_eq!(poller.state().cursor(), &LogCursor::new("g1", 5));
        assert_eq!(poller.sink().events, vec![SinkEvent::Connectivity(true)]);
    }

    #[tokio::test]
    async fn test_version_bump_applies_entries_and_advances() {
        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g1", 6, vec![entry("m1", 1, "response", "hi")]));
        let mut poller = poller_at(backend.clone(), "c1", "g1", 5);

        assert!(poller.poll().await.unwrap());

        assert_eq!(poller.state().cursor(), &LogCursor::new("g1", 6));
        assert_eq!(poller.sink().view.len(), 1);
        assert_eq!(backend.requests()[0].log_from, 5);
    }

    #[tokio::test]
    async fn test_guid_change_clears_before_applying() {
        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g2", 1, vec![entry("n1", 1, "user", "fresh")]));
        let mut poller = poller_at(backend, "c1", "g1", 5);

        assert!(poller.poll().await.unwrap());

        assert_eq!(poller.state().cursor(), &LogCursor::new("g2", 1));
        let events = &poller.sink().events;
        let clear = events.iter().position(|e| *e == SinkEvent::Clear).unwrap();
        let apply = events
            .iter()
            .position(|e| matches!(e, SinkEvent::Apply(_)))
            .unwrap();
        assert!(clear < apply);
    }

    #[tokio::test]
    async fn test_guid_change_with_matching_version_still_resets() {
        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g2", 0, vec![]));
        let mut poller = poller_at(backend, "c1", "g1", 5);

        assert!(!poller.poll().await.unwrap());

        assert_eq!(poller.state().cursor(), &LogCursor::new("g2", 0));
        assert!(poller.sink().events.contains(&SinkEvent::Clear));
    }

    #[tokio::test]
    async fn test_stale_context_is_dropped() {
        let backend = ScriptedBackend::new();
        let mut stale = response("other", "g9", 9, vec![entry("x", 1, "response", "nope")]);
        stale.paused = true;
        backend.push_response(stale);
        let mut poller = poller_at(backend, "c1", "g1", 5);

        assert!(!poller.poll().await.unwrap());

        assert_eq!(poller.state().cursor(), &LogCursor::new("g1", 5));
        assert!(poller.sink().view.is_empty());
        assert!(!poller.is_paused());
    }

    #[tokio::test]
    async fn test_response_without_context_is_dropped() {
        let backend = ScriptedBackend::new();
        let mut anonymous = response("c1", "g1", 6, vec![]);
        anonymous.context = None;
        backend.push_response(anonymous);
        let mut poller = poller_at(backend, "c1", "g1", 5);

        assert!(!poller.poll().await.unwrap());
        assert_eq!(poller.state().cursor().version, 5);
    }

    #[tokio::test]
    async fn test_first_poll_discovers_context() {
        let backend = ScriptedBackend::new();
        backend.push_response(response("found", "g1", 2, vec![entry("m1", 1, "user", "hey")]));
        let mut poller = Poller::new(backend.clone(), RecordingSink::default(), "Europe/Prague");

        assert!(poller.poll().await.unwrap());

        assert_eq!(poller.context(), Some(&SessionContext::new("found")));
        let request = &backend.requests()[0];
        assert_eq!(request.context, None);
        assert_eq!(request.timezone, "Europe/Prague");
    }

    #[tokio::test]
    async fn test_transport_error_marks_disconnected() {
        let backend = ScriptedBackend::new();
        backend.push_error(TransportError::Request {
            message: "connection refused".to_string(),
        });
        let mut poller = poller_at(backend, "c1", "g1", 5);
        poller.state.set_connected(true);

        assert!(!poller.poll().await.unwrap());

        assert!(!poller.is_connected());
        assert_eq!(poller.sink().events, vec![SinkEvent::Connectivity(false)]);
    }

    #[tokio::test]
    async fn test_empty_body_marks_disconnected() {
        let backend = ScriptedBackend::new();
        backend.push_empty();
        let mut poller = poller_at(backend, "c1", "g1", 5);
        poller.state.set_connected(true);

        assert!(!poller.poll().await.unwrap());
        assert!(!poller.is_connected());
    }

    #[tokio::test]
    async fn test_accepted_response_records_chats_and_pause() {
        let backend = ScriptedBackend::new();
        let mut resp = response("c1", "g1", 5, vec![]);
        resp.paused = true;
        resp.contexts = vec![ContextSummary {
            id: "c1".to_string(),
            name: Some("Chat 1".to_string()),
            ..Default::default()
        }];
        backend.push_response(resp);
        let mut poller = poller_at(backend, "c1", "g1", 5);

        poller.poll().await.unwrap();

        assert!(poller.is_paused());
        assert_eq!(poller.chats().len(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_surfaces_as_error() {
        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g1", 6, vec![entry("m1", 1, "response", "hi")]));
        let mut poller = Poller::new(backend, FailingSink, "UTC").with_context("c1".into());
        poller.state.reset_cursor("g1");

        assert!(matches!(poller.poll().await, Err(PollError::Render(_))));
        assert_eq!(poller.state().cursor().version, 0);
    }

    #[tokio::test]
    async fn test_speech_reads_newest_response_once() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceStore::new(dir.path().join("preferences.json"));
        prefs.set_speech_enabled(true).unwrap();

        let backend = ScriptedBackend::new();
        let batch = vec![
            entry("m1", 1, "response", "older"),
            entry("m2", 2, "response", "newest"),
        ];
        backend.push_response(response("c1", "g1", 6, batch.clone()));
        backend.push_response(response("c1", "g1", 7, batch));

        let speaker = RecordingSpeaker::default();
        let mut poller = poller_at(backend, "c1", "g1", 5)
            .with_preferences(prefs)
            .with_speaker(Box::new(speaker.clone()));

        assert!(poller.poll().await.unwrap());
        assert!(poller.poll().await.unwrap());

        assert_eq!(speaker.spoken(), vec!["newest".to_string()]);
        assert_eq!(poller.state().last_spoken_no(), 2);
    }

    #[tokio::test]
    async fn test_speech_disabled_by_preference() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceStore::new(dir.path().join("preferences.json"));

        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g1", 6, vec![entry("m1", 1, "response", "hi")]));

        let speaker = RecordingSpeaker::default();
        let mut poller = poller_at(backend, "c1", "g1", 5)
            .with_preferences(prefs)
            .with_speaker(Box::new(speaker.clone()));

        assert!(poller.poll().await.unwrap());
        assert!(speaker.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_turning_speech_off_silences_current_utterance() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceStore::new(dir.path().join("preferences.json"));
        prefs.set_speech_enabled(true).unwrap();

        let backend = ScriptedBackend::new();
        backend.push_response(response("c1", "g1", 6, vec![entry("m1", 1, "response", "long")]));
        backend.push_response(response("c1", "g1", 7, vec![entry("m2", 2, "agent", "working")]));

        let speaker = RecordingSpeaker::default();
        let mut poller = poller_at(backend, "c1", "g1", 5)
            .with_preferences(prefs.clone())
            .with_speaker(Box::new(speaker.clone()));

        assert!(poller.poll().await.unwrap());
        assert_eq!(speaker.stops(), 0);

        prefs.set_speech_enabled(false).unwrap();
        assert!(poller.poll().await.unwrap());

        assert_eq!(speaker.spoken(), vec!["long".to_string()]);
        assert_eq!(speaker.stops(), 1);
    }

    #[tokio::test]
    async fn test_switch_context_clears_rendered_log() {
        let backend = ScriptedBackend::new();
        let mut poller = poller_at(backend, "c1", "g1", 5);

        assert!(poller.switch_context("c2".into()).unwrap());
        assert!(!poller.switch_context("c2".into()).unwrap());

        assert_eq!(poller.state().cursor(), &LogCursor::default());
        assert_eq!(poller.sink().events, vec![SinkEvent::Clear]);
    }
}
