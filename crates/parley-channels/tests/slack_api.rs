//! Mock HTTP server tests for `SlackApiClient`.
//!
//! Uses [`wiremock`] to emulate the Slack Web API so the full
//! request/response path runs without a workspace.
//!
//! Coverage:
//! - `auth.test` success and `invalid_auth`
//! - `users.conversations` cursor pagination
//! - `conversations.history` parsing
//! - `conversations.replies` parent-first ordering
//! - HTTP 429 and `ok: false` rate limiting
//! - `chat.postMessage` threading
//! - One poll cycle end to end

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_channels::slack::api::SlackApiClient;
use parley_channels::slack::poll::{
    ChannelKind, ConversationSource, PollSettings, SlackPoller, SlackTs, is_rate_limited,
};
use parley_channels::traits::ChannelHost;
use parley_types::error::ChannelError;
use parley_types::event::InboundMessage;
use parley_types::secret::SecretString;

fn client(server: &MockServer) -> SlackApiClient {
    SlackApiClient::with_base_url(
        SecretString::new("xoxb-mock"),
        Duration::from_secs(5),
        server.uri(),
    )
    .unwrap()
}

struct CollectingHost {
    messages: Mutex<Vec<InboundMessage>>,
}

#[async_trait]
impl ChannelHost for CollectingHost {
    async fn deliver_inbound(&self, msg: InboundMessage) -> Result<(), ChannelError> {
        self.messages.lock().await.push(msg);
        Ok(())
    }
}

// ── auth.test ──────────────────────────────────────────────────────────

#[tokio::test]
async fn auth_test_returns_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth.test"))
        .and(header("Authorization", "Bearer xoxb-mock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "user": "parley",
            "user_id": "U0SELF",
            "team_id": "T1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server).auth_identity().await.unwrap();
    assert_eq!(id, "U0SELF");
}

#[tokio::test]
async fn auth_test_invalid_auth_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth.test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "invalid_auth"})),
        )
        .mount(&server)
        .await;

    match client(&server).auth_test().await {
        Err(ChannelError::AuthFailed(msg)) => assert!(msg.contains("invalid_auth"), "{msg}"),
        other => panic!("expected AuthFailed, got: {other:?}"),
    }
}

// ── users.conversations ────────────────────────────────────────────────

#[tokio::test]
async fn list_channels_follows_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users.conversations"))
        .and(query_param("types", "public_channel"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channels": [{"id": "C3"}],
            "response_metadata": {"next_cursor": ""}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users.conversations"))
        .and(query_param("types", "public_channel"))
        .and(query_param("exclude_archived", "true"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channels": [{"id": "C1", "name": "general"}, {"id": "C2", "name": "random"}],
            "response_metadata": {"next_cursor": "page-2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channels = client(&server)
        .list_channels(ChannelKind::PublicChannel)
        .await
        .unwrap();

    let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C1", "C2", "C3"]);
    assert!(channels.iter().all(|c| c.kind == ChannelKind::PublicChannel));
}

#[tokio::test]
async fn list_channels_missing_scope_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users.conversations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "missing_scope"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .list_channels(ChannelKind::PrivateChannel)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing_scope"));
    assert!(!is_rate_limited(&err));
}

// ── conversations.history / replies ────────────────────────────────────

#[tokio::test]
async fn history_is_parsed_into_raw_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .and(query_param("channel", "C1"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "messages": [
                {"type": "message", "user": "U1", "text": "<@U0SELF> ping", "ts": "1700000003.000100"},
                {"type": "message", "user": "U2", "text": "thread root", "ts": "1700000002.000100",
                 "thread_ts": "1700000002.000100", "reply_count": 2,
                 "latest_reply": "1700000009.000000"},
                {"type": "message", "bot_id": "B1", "subtype": "bot_message", "text": "beep",
                 "ts": "1700000001.000100"}
            ],
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = client(&server).fetch_history("C1", 20).await.unwrap();

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].id, "1700000003.000100");
    assert!(messages[0].mentions("U0SELF"));
    assert!(messages[1].is_top_level());
    assert_eq!(messages[1].reply_count, 2);
    assert_eq!(messages[1].latest_reply_id.as_deref(), Some("1700000009.000000"));
    assert!(messages[2].is_bot);
}

#[tokio::test]
async fn replies_keep_parent_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.replies"))
        .and(query_param("channel", "C1"))
        .and(query_param("ts", "1700000002.000100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "messages": [
                {"user": "U2", "text": "thread root", "ts": "1700000002.000100",
                 "thread_ts": "1700000002.000100", "reply_count": 1},
                {"user": "U1", "text": "a reply", "ts": "1700000009.000000",
                 "thread_ts": "1700000002.000100"}
            ]
        })))
        .mount(&server)
        .await;

    let replies = client(&server)
        .fetch_thread_replies("C1", "1700000002.000100", 50)
        .await
        .unwrap();

    assert_eq!(replies.len(), 2);
    assert!(replies[0].is_top_level());
    assert_eq!(replies[1].thread_parent_id.as_deref(), Some("1700000002.000100"));
}

// ── Rate limiting ──────────────────────────────────────────────────────

#[tokio::test]
async fn http_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_history("C1", 20).await.unwrap_err();
    assert!(matches!(err, ChannelError::ReceiveFailed(_)));
    assert!(is_rate_limited(&err), "{err}");
    assert!(err.to_string().contains("30"));
}

#[tokio::test]
async fn ok_false_ratelimited_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "ratelimited"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).fetch_history("C1", 20).await.unwrap_err();
    assert!(is_rate_limited(&err));
}

#[tokio::test]
async fn server_error_is_not_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).fetch_history("C1", 20).await.unwrap_err();
    assert!(!is_rate_limited(&err));
    assert!(err.to_string().contains("500"));
}

// ── chat.postMessage ───────────────────────────────────────────────────

#[tokio::test]
async fn post_message_in_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("Authorization", "Bearer xoxb-mock"))
        .and(body_partial_json(serde_json::json!({
            "channel": "C1",
            "text": "on it",
            "thread_ts": "1700000002.000100"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channel": "C1",
            "ts": "1700000010.000200"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ts = client(&server)
        .chat_post_message("C1", "on it", Some("1700000002.000100"))
        .await
        .unwrap();
    assert_eq!(ts, "1700000010.000200");
}

#[tokio::test]
async fn post_message_failure_is_send_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "channel_not_found"})),
        )
        .mount(&server)
        .await;

    match client(&server).chat_post_message("C404", "hi", None).await {
        Err(ChannelError::SendFailed(msg)) => assert!(msg.contains("channel_not_found")),
        other => panic!("expected SendFailed, got: {other:?}"),
    }
}

// ── End to end ─────────────────────────────────────────────────────────

#[tokio::test]
async fn one_cycle_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users.conversations"))
        .and(query_param("types", "im"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channels": [{"id": "D1"}]
        })))
        .mount(&server)
        .await;

    // Every other kind: member of nothing.
    Mock::given(method("GET"))
        .and(path("/users.conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channels": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .and(query_param("channel", "D1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "messages": [
                {"user": "U1", "text": "are you there?", "ts": "1700000005.000000"},
                {"user": "U1", "text": "from last week", "ts": "1699000000.000000"}
            ]
        })))
        .mount(&server)
        .await;

    let source: Arc<dyn ConversationSource> = Arc::new(client(&server));
    let mut poller = SlackPoller::new(source, "U0SELF", PollSettings::default())
        .with_watermark(SlackTs::parse("1700000000.000000").unwrap());
    let host = CollectingHost {
        messages: Mutex::new(vec![]),
    };

    let report = poller.poll_once(&host, &CancellationToken::new()).await;

    assert_eq!(report.channels, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.suppressed, 1);
    let delivered = host.messages.lock().await;
    assert_eq!(delivered[0].content, "are you there?");
    assert_eq!(delivered[0].chat_id, "D1");
}
