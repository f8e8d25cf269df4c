//! End-to-end poll cycles over HTTP: a mock backend, the real transport,
//! and an in-memory log view.

use std::time::Duration;

use serde_json::{Value, json};
use tether_core::config::BackendConfig;
use tether_core::{ChatError, EntryKey, HttpBackend, LogCursor, LogView, Poller, RestartOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn poll_body(guid: &str, version: u64, logs: Value) -> Value {
    json!({
        "context": "c1",
        "log_guid": guid,
        "log_version": version,
        "log_progress": "",
        "log_progress_active": false,
        "logs": logs
    })
}

/// Serve `first` once, then `then` for every later poll.
async fn serve(server: &MockServer, first: Value, then: Value) {
    Mock::given(method("POST"))
        .and(path("/poll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/poll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(then))
        .mount(server)
        .await;
}

/// A poller on context c1 whose cursor sits at (g1, 5) after one poll.
async fn poller_at_g1_v5(server: &MockServer) -> Poller<HttpBackend, LogView> {
    let backend = HttpBackend::new(&BackendConfig {
        url: Some(server.uri()),
        ..Default::default()
    })
    .unwrap();
    let mut poller = Poller::new(backend, LogView::new(), "UTC").with_context("c1".into());

    assert!(poller.poll().await.unwrap());
    assert_eq!(poller.state().cursor(), &LogCursor::new("g1", 5));
    poller
}

fn history() -> Value {
    json!([
        {"id": "m0", "no": 1, "type": "user", "content": "hello"},
        {"id": "m1", "no": 2, "type": "response", "content": "hi"}
    ])
}

#[tokio::test]
async fn test_unchanged_cursor_returns_false() {
    let server = MockServer::start().await;
    serve(&server, poll_body("g1", 5, history()), poll_body("g1", 5, history())).await;
    let mut poller = poller_at_g1_v5(&server).await;

    assert!(!poller.poll().await.unwrap());

    assert_eq!(poller.state().cursor(), &LogCursor::new("g1", 5));
    assert_eq!(poller.sink().len(), 2);
}

#[tokio::test]
async fn test_version_bump_applies_without_duplicates() {
    let server = MockServer::start().await;
    let mut grown = history();
    grown
        .as_array_mut()
        .unwrap()
        .push(json!({"id": "m2", "no": 3, "type": "response", "content": "anything else?"}));
    serve(&server, poll_body("g1", 5, history()), poll_body("g1", 6, grown)).await;
    let mut poller = poller_at_g1_v5(&server).await;

    assert!(poller.poll().await.unwrap());

    assert_eq!(poller.state().cursor(), &LogCursor::new("g1", 6));
    assert_eq!(poller.sink().len(), 3);
    assert_eq!(
        poller
            .sink()
            .get(&EntryKey::Id("m2".to_string()))
            .map(|e| e.content.as_str()),
        Some("anything else?")
    );
}

#[tokio::test]
async fn test_new_guid_replaces_history() {
    let server = MockServer::start().await;
    serve(
        &server,
        poll_body("g1", 5, history()),
        poll_body(
            "g2",
            1,
            json!([{"id": "n1", "no": 1, "type": "user", "content": "fresh start"}]),
        ),
    )
    .await;
    let mut poller = poller_at_g1_v5(&server).await;
    let clears_before = poller.sink().clear_count();

    assert!(poller.poll().await.unwrap());

    assert_eq!(poller.state().cursor(), &LogCursor::new("g2", 1));
    assert_eq!(poller.sink().clear_count(), clears_before + 1);
    assert_eq!(poller.sink().len(), 1);
    assert_eq!(poller.sink().entries()[0].content, "fresh start");
}

#[tokio::test]
async fn test_unreachable_backend_reports_disconnected() {
    // Nothing listens on port 9 on CI machines.
    let backend = HttpBackend::new(&BackendConfig {
        url: Some("http://127.0.0.1:9".to_string()),
        request_timeout_ms: Some(2_000),
        ..Default::default()
    })
    .unwrap();
    let mut poller = Poller::new(backend, LogView::new(), "UTC").with_context("c1".into());

    assert!(!poller.poll().await.unwrap());

    assert!(!poller.is_connected());
    assert!(!poller.sink().is_connected());
    assert_eq!(poller.state().cursor(), &LogCursor::default());
}

#[tokio::test]
async fn test_progress_is_forwarded() {
    let server = MockServer::start().await;
    let mut working = poll_body("g1", 6, history());
    working["log_progress"] = json!("Calling tool...");
    working["log_progress_active"] = json!(true);
    serve(&server, poll_body("g1", 5, history()), working).await;
    let mut poller = poller_at_g1_v5(&server).await;

    assert!(poller.poll().await.unwrap());

    assert_eq!(poller.sink().progress().message, "Calling tool...");
    assert!(poller.sink().progress().active);
}

#[tokio::test]
async fn test_restart_waits_until_health_answers() {
    let server = MockServer::start().await;
    serve(&server, poll_body("g1", 5, history()), poll_body("g1", 5, history())).await;
    Mock::given(method("POST"))
        .and(path("/restart"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    let mut poller = poller_at_g1_v5(&server).await;

    let outcome = poller.restart_backend(10, Duration::from_millis(5)).await.unwrap();

    assert_eq!(outcome, RestartOutcome::CameBack { attempts: 3 });
}

#[tokio::test]
async fn test_restart_times_out_when_backend_stays_down() {
    let server = MockServer::start().await;
    serve(&server, poll_body("g1", 5, history()), poll_body("g1", 5, history())).await;
    Mock::given(method("POST"))
        .and(path("/restart"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;
    let mut poller = poller_at_g1_v5(&server).await;

    let result = poller.restart_backend(4, Duration::from_millis(5)).await;

    assert!(matches!(result, Err(ChatError::RestartTimedOut { attempts: 4 })));
    assert!(!poller.is_connected());
}

#[tokio::test]
async fn test_loaded_chat_becomes_active() {
    let server = MockServer::start().await;
    serve(&server, poll_body("g1", 5, history()), poll_body("g1", 5, history())).await;
    Mock::given(method("POST"))
        .and(path("/chat_load"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ctxids": ["loaded-1"]})))
        .mount(&server)
        .await;
    let mut poller = poller_at_g1_v5(&server).await;

    let loaded = poller.load_chats(vec!["{}".to_string()]).await.unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(poller.context().map(|c| c.as_str()), Some("loaded-1"));
    assert_eq!(poller.state().cursor(), &LogCursor::default());
    assert!(poller.sink().is_empty());
}
