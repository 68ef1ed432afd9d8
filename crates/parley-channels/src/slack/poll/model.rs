//! Values flowing through one poll cycle.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use parley_types::event::InboundMessage;

/// A Slack message timestamp (`"1700000000.000100"`).
///
/// Slack uses the `ts` string as the message id; parsing it gives a
/// total order by `(seconds, microseconds)`. Fractions longer than six
/// digits are truncated, shorter ones are right-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlackTs {
    secs: u64,
    micros: u32,
}

impl SlackTs {
    pub fn new(secs: u64, micros: u32) -> Self {
        Self {
            secs,
            micros: micros.min(999_999),
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self::new(
            u64::try_from(now.timestamp()).unwrap_or_default(),
            now.timestamp_subsec_micros(),
        )
    }

    /// Parse a Slack `ts`. Returns `None` for anything that is not
    /// `<digits>[.<digits>]`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (secs, frac) = raw.trim().split_once('.').unwrap_or((raw.trim(), ""));
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let secs = secs.parse().ok()?;
        let micros = frac
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(6)
            .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0'));
        Some(Self { secs, micros })
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.secs).ok()?;
        Utc.timestamp_opt(secs, self.micros * 1_000).single()
    }
}

impl fmt::Display for SlackTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// What kind of conversation a channel id refers to.
///
/// The kind decides the mention policy: direct and group-direct messages
/// are always addressed to us, channels need an explicit `<@self>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    DirectMessage,
    GroupDirectMessage,
    PublicChannel,
    PrivateChannel,
}

impl ChannelKind {
    /// Every kind, in the order the enumerator lists them.
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::DirectMessage,
        ChannelKind::GroupDirectMessage,
        ChannelKind::PublicChannel,
        ChannelKind::PrivateChannel,
    ];

    /// The `types=` value Slack's conversation list endpoints expect.
    pub fn slack_type(self) -> &'static str {
        match self {
            Self::DirectMessage => "im",
            Self::GroupDirectMessage => "mpim",
            Self::PublicChannel => "public_channel",
            Self::PrivateChannel => "private_channel",
        }
    }

    pub fn is_direct(self) -> bool {
        matches!(self, Self::DirectMessage | Self::GroupDirectMessage)
    }

    pub fn requires_mention(self) -> bool {
        !self.is_direct()
    }
}

/// A conversation visible to the polling identity. Lives for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub id: String,
    pub kind: ChannelKind,
}

impl ChannelDescriptor {
    pub fn new(id: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// A message as fetched from history or a thread, before filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Slack `ts`; both the ordering key and the dedup key.
    pub id: String,
    pub sender_id: Option<String>,
    pub text: Option<String>,
    /// Non-null for system events (joins, edits, bot posts, ...).
    pub subtype: Option<String>,
    pub is_bot: bool,
    /// Set on thread replies; `None` for top-level messages.
    pub thread_parent_id: Option<String>,
    pub reply_count: u32,
    pub latest_reply_id: Option<String>,
}

impl RawMessage {
    pub fn ts(&self) -> Option<SlackTs> {
        SlackTs::parse(&self.id)
    }

    pub fn is_top_level(&self) -> bool {
        self.thread_parent_id.is_none()
    }

    /// Whether the text addresses `user_id` with `<@ID>` or `<@ID|label>`.
    pub fn mentions(&self, user_id: &str) -> bool {
        let Some(text) = self.text.as_deref() else {
            return false;
        };
        if user_id.is_empty() {
            return false;
        }
        let needle = format!("<@{user_id}");
        text.match_indices(&needle).any(|(at, _)| {
            matches!(text[at + needle.len()..].chars().next(), Some('>') | Some('|'))
        })
    }
}

/// A thread parent whose latest reply is newer than the watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadCandidate {
    pub channel_id: String,
    pub thread_parent_id: String,
    /// Kind of the parent channel; replies inherit its mention policy.
    pub kind: ChannelKind,
}

/// A message accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// Conversation id.
    pub channel: String,
    pub sender: String,
    pub text: String,
    /// Slack `ts`.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub channel_kind: ChannelKind,
    pub thread_parent_id: Option<String>,
}

impl NormalizedMessage {
    /// Build from a message the filter accepted in `channel`.
    pub fn from_raw(message: &RawMessage, channel: &str, kind: ChannelKind) -> Self {
        Self {
            channel: channel.to_owned(),
            sender: message.sender_id.clone().unwrap_or_default(),
            text: message.text.clone().unwrap_or_default(),
            id: message.id.clone(),
            timestamp: message
                .ts()
                .and_then(SlackTs::to_datetime)
                .unwrap_or_else(Utc::now),
            channel_kind: kind,
            thread_parent_id: message.thread_parent_id.clone(),
        }
    }

    /// Convert to the host's inbound event, tagged `source = "message"`.
    pub fn into_inbound(self) -> InboundMessage {
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("source".into(), serde_json::Value::from("message"));
        metadata.insert("ts".into(), serde_json::Value::from(self.id));
        metadata.insert(
            "channel_kind".into(),
            serde_json::to_value(self.channel_kind).unwrap_or_default(),
        );
        if let Some(parent) = self.thread_parent_id {
            metadata.insert("thread_ts".into(), serde_json::Value::from(parent));
        }

        InboundMessage {
            channel: "slack".into(),
            sender_id: self.sender,
            chat_id: self.channel,
            content: self.text,
            timestamp: self.timestamp,
            metadata,
        }
    }
}
