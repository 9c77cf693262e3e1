use std::sync::Arc;
use std::time::Duration;

use viridian_core::config::{ClientConfig, VoiceMode};
use viridian_core::text::{NOTICE_NO_REPLY, NOTICE_SESSION_FAILED};
use viridian_core::types::Sender;
use viridian_engine::controller::{DispatchOutcome, IgnoreReason};
use viridian_engine::view::MemoryView;
use viridian_runtime::config_store::ConfigStore;
use viridian_runtime::controller_builder::build_controller_from_config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        voice_mode: VoiceMode::Off,
        ..Default::default()
    }
}

async fn mount_json(server: &MockServer, route: &str, body: &'static str) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn config_file_to_conversation() {
    let server = MockServer::start().await;
    mount_json(&server, "/start_session", r#"{"session_id":"abc"}"#).await;
    mount_json(&server, "/send_text", r#"{"reply":"hi","emotion":"joy"}"#).await;

    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::at_path(dir.path().join("viridian.json"));
    store.save(&config_for(&server)).unwrap();
    let cfg = store.load().unwrap();

    let view = Arc::new(MemoryView::new());
    let c = build_controller_from_config(&cfg, view.clone()).unwrap();

    assert!(c.start_session().await.is_some());
    assert_eq!(c.send_text("hello").await, DispatchOutcome::Replied);
    assert_eq!(
        view.messages(),
        vec![
            ("hello".to_string(), Sender::User),
            ("hi".to_string(), Sender::Bot)
        ]
    );
}

#[tokio::test]
async fn slow_reply_blocks_second_send() {
    let server = MockServer::start().await;
    mount_json(&server, "/start_session", r#"{"session_id":"abc"}"#).await;
    Mock::given(method("POST"))
        .and(path("/send_text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"emotion":"sadness"}"#, "application/json")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let view = Arc::new(MemoryView::new());
    let c = build_controller_from_config(&config_for(&server), view.clone()).unwrap();
    c.start_session().await;

    let first = {
        let c = c.clone();
        tokio::spawn(async move { c.send_text("first").await })
    };
    while !c.is_busy() {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        c.send_text("second").await,
        DispatchOutcome::Ignored(IgnoreReason::Busy)
    );
    assert_eq!(first.await.unwrap(), DispatchOutcome::NoReply);

    assert_eq!(
        view.messages(),
        vec![
            ("first".to_string(), Sender::User),
            (NOTICE_NO_REPLY.to_string(), Sender::Bot)
        ]
    );
}

#[tokio::test]
async fn missing_session_id_is_a_failed_start() {
    let server = MockServer::start().await;
    mount_json(&server, "/start_session", r#"{}"#).await;

    let view = Arc::new(MemoryView::new());
    let c = build_controller_from_config(&config_for(&server), view.clone()).unwrap();

    assert!(c.start_session().await.is_none());
    assert_eq!(
        view.messages(),
        vec![(NOTICE_SESSION_FAILED.to_string(), Sender::Bot)]
    );
    assert_eq!(
        c.send_text("hello").await,
        DispatchOutcome::Ignored(IgnoreReason::NoSession)
    );
}
