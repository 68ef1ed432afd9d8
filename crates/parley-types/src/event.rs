//! Message events exchanged between channel plugins and the host.
//!
//! [`InboundMessage`] is what a plugin hands to the host's delivery sink.
//! [`OutboundMessage`] is what the host asks a plugin to post.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message received from a chat channel and delivered to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel plugin name (e.g. `"slack"`).
    pub channel: String,

    /// Sender identifier within the channel.
    pub sender_id: String,

    /// Conversation identifier within the channel.
    pub chat_id: String,

    /// Message text content.
    pub content: String,

    /// When the message was posted (or received, if the provider
    /// timestamp could not be read).
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Channel-specific metadata (`ts`, `thread_ts`, `source`, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A message the host wants posted to a chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Target channel plugin name.
    pub channel: String,

    /// Target conversation identifier.
    pub chat_id: String,

    /// Message text content.
    pub content: String,

    /// Channel-specific metadata (`thread_ts` to reply in a thread).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
