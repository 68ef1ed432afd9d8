//! Slack Web API response types.
//!
//! Only the fields the poller reads are modelled; everything else in a
//! response is ignored.

use serde::Deserialize;

use super::poll::model::{ChannelDescriptor, ChannelKind, RawMessage};

/// Envelope shared by every Web API response.
///
/// Slack reports failure in-band with `ok: false` and a short error code
/// such as `"ratelimited"` or `"channel_not_found"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,

    /// Error code if `ok` is `false`.
    #[serde(default)]
    pub error: Option<String>,

    #[serde(flatten)]
    pub body: T,
}

/// Body of `auth.test`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthTestBody {
    /// User id of the token's identity.
    pub user_id: Option<String>,
    /// Display handle.
    pub user: Option<String>,
    pub team_id: Option<String>,
}

/// One page of `users.conversations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationsPage {
    #[serde(default)]
    pub channels: Vec<ConversationInfo>,

    pub response_metadata: Option<ResponseMetadata>,
}

impl ConversationsPage {
    /// Cursor for the next page; `None` once the listing is drained.
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata
            .as_ref()
            .map(|m| m.next_cursor.as_str())
            .filter(|c| !c.is_empty())
    }
}

/// A conversation as listed by `users.conversations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationInfo {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
}

impl ConversationInfo {
    pub fn into_descriptor(self, kind: ChannelKind) -> ChannelDescriptor {
        ChannelDescriptor::new(self.id, kind)
    }
}

/// Pagination block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: String,
}

/// Body of `conversations.history` and `conversations.replies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesBody {
    #[serde(default)]
    pub messages: Vec<SlackMessage>,

    #[serde(default)]
    pub has_more: bool,
}

/// A message as returned by the history and replies endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackMessage {
    /// Message timestamp; unique within the channel.
    #[serde(default)]
    pub ts: String,

    /// Author's user id. Absent on some bot and system messages.
    pub user: Option<String>,

    pub text: Option<String>,

    /// Set on system events (`channel_join`, `bot_message`, ...).
    pub subtype: Option<String>,

    /// Present when a bot posted the message.
    pub bot_id: Option<String>,

    /// Root of the thread. Equal to `ts` on the parent itself.
    pub thread_ts: Option<String>,

    #[serde(default)]
    pub reply_count: u32,

    /// `ts` of the newest reply, on thread parents.
    pub latest_reply: Option<String>,
}

impl From<SlackMessage> for RawMessage {
    fn from(m: SlackMessage) -> Self {
        let thread_parent_id = m.thread_ts.filter(|parent| *parent != m.ts);
        RawMessage {
            id: m.ts,
            sender_id: m.user,
            text: m.text,
            subtype: m.subtype,
            is_bot: m.bot_id.is_some(),
            thread_parent_id,
            reply_count: m.reply_count,
            latest_reply_id: m.latest_reply,
        }
    }
}

/// Body of `chat.postMessage`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostMessageBody {
    /// Timestamp of the posted message.
    pub ts: Option<String>,
    pub channel: Option<String>,
}
