//! Configuration schema.
//!
//! All structs accept both `snake_case` and `camelCase` field names via
//! `#[serde(alias)]`, and unknown fields are ignored so older binaries
//! can read newer config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParleyError, Result};
use crate::secret::SecretString;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat channel configurations.
    #[serde(default)]
    pub channels: ChannelsConfig,
}

impl Config {
    /// Deserialize from an already key-normalized JSON value.
    pub fn from_value(raw: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(raw)?)
    }
}

/// Configuration for every supported chat channel.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    /// Slack (polling mode).
    #[serde(default)]
    pub slack: SlackConfig,
}

/// Slack polling channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Whether this channel is enabled.
    #[serde(default)]
    pub enabled: bool,

    /// Bot or user token (`xoxb-...` / `xoxp-...`).
    #[serde(default, alias = "botToken")]
    pub bot_token: SecretString,

    /// Environment variable holding the token; used when `bot_token` is empty.
    #[serde(default, alias = "botTokenEnv")]
    pub bot_token_env: Option<String>,

    /// The identity's own user id. Resolved with `auth.test` when unset.
    #[serde(default, alias = "botUserId")]
    pub bot_user_id: Option<String>,

    /// Seconds to sleep between poll cycles. Must be at least 1.
    #[serde(default = "default_poll_interval_secs", alias = "pollIntervalSecs")]
    pub poll_interval_secs: u64,

    /// Page size for `conversations.history`.
    #[serde(default = "default_history_limit", alias = "historyLimit")]
    pub history_limit: u32,

    /// Page size for `conversations.replies`.
    #[serde(default = "default_thread_reply_limit", alias = "threadReplyLimit")]
    pub thread_reply_limit: u32,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs", alias = "requestTimeoutSecs")]
    pub request_timeout_secs: u64,

    /// Sender ids allowed to reach the host. Empty = everyone.
    #[serde(default, alias = "allowFrom")]
    pub allow_from: Vec<String>,
}

fn default_poll_interval_secs() -> u64 {
    10
}
fn default_history_limit() -> u32 {
    20
}
fn default_thread_reply_limit() -> u32 {
    50
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl SlackConfig {
    /// Interval between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ParleyError::ConfigInvalid {
                reason: reason.to_owned(),
            })
        };
        if self.poll_interval_secs < 1 {
            return invalid("poll_interval_secs must be at least 1");
        }
        if self.history_limit == 0 {
            return invalid("history_limit must be at least 1");
        }
        // Item 0 of a replies page is the parent, so 1 would never yield a reply.
        if self.thread_reply_limit < 2 {
            return invalid("thread_reply_limit must be at least 2");
        }
        Ok(())
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: SecretString::default(),
            bot_token_env: None,
            bot_user_id: None,
            poll_interval_secs: default_poll_interval_secs(),
            history_limit: default_history_limit(),
            thread_reply_limit: default_thread_reply_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            allow_from: Vec::new(),
        }
    }
}
