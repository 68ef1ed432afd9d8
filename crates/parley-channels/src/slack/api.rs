//! Slack Web API client.
//!
//! [`SlackApiClient`] provides typed methods for the subset of the
//! Slack Web API used by the polling channel: `auth.test`,
//! `users.conversations`, `conversations.history`,
//! `conversations.replies`, and `chat.postMessage`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use parley_types::error::ChannelError;
use parley_types::secret::SecretString;

use super::poll::ConversationSource;
use super::poll::model::{ChannelDescriptor, ChannelKind, RawMessage};
use super::types::{
    ApiResponse, AuthTestBody, ConversationInfo, ConversationsPage, MessagesBody,
    PostMessageBody,
};

/// Base URL for the Slack Web API.
const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size for `users.conversations` (Slack's documented maximum is 1000).
const LIST_PAGE_SIZE: u32 = 200;

/// Upper bound on `users.conversations` pages followed per kind.
const MAX_LIST_PAGES: usize = 50;

/// HTTP client for the Slack Web API.
///
/// Wraps a [`reqwest::Client`] and the bot token to provide typed
/// request methods. The base URL can be overridden for testing.
pub struct SlackApiClient {
    /// Shared HTTP client.
    http: Client,
    /// Bot token for API authorization.
    bot_token: SecretString,
    /// Base URL for API calls.
    base_url: String,
}

impl SlackApiClient {
    /// Create a new client with the given token and per-request timeout.
    pub fn new(bot_token: SecretString, timeout: Duration) -> Result<Self, ChannelError> {
        Self::with_base_url(bot_token, timeout, SLACK_API_BASE)
    }

    /// Create a client pointing at a custom base URL (for testing).
    pub fn with_base_url(
        bot_token: SecretString,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self, ChannelError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            bot_token,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Return the base URL used for API requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a read-only Web API call and unwrap its envelope.
    ///
    /// HTTP 429 and `ok: false` both surface as
    /// [`ChannelError::ReceiveFailed`] carrying the method name and
    /// Slack's error code, so throttling can be recognised by
    /// [`is_rate_limited`](super::poll::is_rate_limited).
    async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, ChannelError> {
        let url = format!("{}/{method}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.bot_token.expose())
            .query(params)
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionFailed(format!("{method}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_owned();
            return Err(ChannelError::ReceiveFailed(format!(
                "{method} failed: ratelimited (retry after {retry_after}s)"
            )));
        }
        if !status.is_success() {
            return Err(ChannelError::ReceiveFailed(format!(
                "{method} failed: HTTP {status}"
            )));
        }

        let body: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| ChannelError::ReceiveFailed(format!("{method}: invalid response: {e}")))?;

        if !body.ok {
            let err_msg = body.error.unwrap_or_else(|| "unknown error".into());
            return Err(ChannelError::ReceiveFailed(format!(
                "{method} failed: {err_msg}"
            )));
        }

        Ok(body.body)
    }

    /// Call `auth.test` and return the token identity's user id.
    pub async fn auth_test(&self) -> Result<String, ChannelError> {
        debug!("calling auth.test");

        let body: AuthTestBody = self.get("auth.test", &[]).await.map_err(|e| match e {
            ChannelError::ReceiveFailed(msg) => ChannelError::AuthFailed(msg),
            other => other,
        })?;

        body.user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ChannelError::AuthFailed("auth.test returned ok but no user_id".into()))
    }

    /// List every conversation of the given Slack `types` value the
    /// identity is a member of, following `next_cursor` until drained.
    pub async fn users_conversations(
        &self,
        types: &str,
    ) -> Result<Vec<ConversationInfo>, ChannelError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..MAX_LIST_PAGES {
            let mut params = vec![
                ("types", types.to_owned()),
                ("exclude_archived", "true".to_owned()),
                ("limit", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(c) = cursor.take() {
                params.push(("cursor", c));
            }

            let body: ConversationsPage = self.get("users.conversations", &params).await?;
            debug!(types = %types, page, count = body.channels.len(), "listed conversations page");

            let next = body.next_cursor().map(str::to_owned);
            channels.extend(body.channels);

            match next {
                Some(c) => cursor = Some(c),
                None => return Ok(channels),
            }
        }

        warn!(
            types = %types,
            pages = MAX_LIST_PAGES,
            "users.conversations pagination cap reached; listing truncated"
        );
        Ok(channels)
    }

    /// The most recent `limit` messages of `channel`, newest first.
    pub async fn conversations_history(
        &self,
        channel: &str,
        limit: u32,
    ) -> Result<MessagesBody, ChannelError> {
        debug!(channel = %channel, limit, "fetching history");
        self.get(
            "conversations.history",
            &[("channel", channel.to_owned()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Up to `limit` messages of a thread, parent first.
    pub async fn conversations_replies(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: u32,
    ) -> Result<MessagesBody, ChannelError> {
        debug!(channel = %channel, thread_ts = %thread_ts, limit, "fetching thread replies");
        self.get(
            "conversations.replies",
            &[
                ("channel", channel.to_owned()),
                ("ts", thread_ts.to_owned()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Post a message to a Slack channel.
    ///
    /// Returns the message timestamp (`ts`) on success.
    pub async fn chat_post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String, ChannelError> {
        let url = format!("{}/chat.postMessage", self.base_url);

        let mut body = serde_json::json!({
            "channel": channel,
            "text": text,
        });

        if let Some(ts) = thread_ts {
            body["thread_ts"] = serde_json::Value::String(ts.to_owned());
        }

        debug!(channel = %channel, "posting message");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.bot_token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChannelError::SendFailed(
                "chat.postMessage failed: ratelimited".into(),
            ));
        }

        let result: ApiResponse<PostMessageBody> = resp
            .json()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        if !result.ok {
            let err_msg = result.error.unwrap_or_else(|| "unknown error".into());
            return Err(ChannelError::SendFailed(format!(
                "chat.postMessage failed: {err_msg}"
            )));
        }

        result.body.ts.ok_or_else(|| {
            ChannelError::SendFailed("chat.postMessage returned ok but no ts".into())
        })
    }
}

#[async_trait]
impl ConversationSource for SlackApiClient {
    async fn auth_identity(&self) -> Result<String, ChannelError> {
        self.auth_test().await
    }

    async fn list_channels(&self, kind: ChannelKind) -> Result<Vec<ChannelDescriptor>, ChannelError> {
        let listed = self.users_conversations(kind.slack_type()).await?;
        Ok(listed
            .into_iter()
            .filter(|c| !c.is_archived)
            .map(|c| c.into_descriptor(kind))
            .collect())
    }

    async fn fetch_history(&self, channel: &str, limit: u32) -> Result<Vec<RawMessage>, ChannelError> {
        let body = self.conversations_history(channel, limit).await?;
        Ok(body.messages.into_iter().map(RawMessage::from).collect())
    }

    async fn fetch_thread_replies(
        &self,
        channel: &str,
        parent: &str,
        limit: u32,
    ) -> Result<Vec<RawMessage>, ChannelError> {
        let body = self.conversations_replies(channel, parent, limit).await?;
        Ok(body.messages.into_iter().map(RawMessage::from).collect())
    }
}
