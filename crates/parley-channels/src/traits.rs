//! Channel plugin traits.
//!
//! - [`Channel`] -- implemented by each channel plugin
//! - [`ChannelHost`] -- implemented by the host; the delivery sink that
//!   plugins push inbound messages into
//! - [`ChannelFactory`] -- builds a [`Channel`] from its JSON config section

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use parley_types::error::ChannelError;
use parley_types::event::{InboundMessage, OutboundMessage};

/// Static description of a channel plugin.
#[derive(Debug, Clone)]
pub struct ChannelMetadata {
    /// Channel identifier (e.g. `"slack"`).
    pub name: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Whether replies can be threaded under a parent message.
    pub supports_threads: bool,
}

/// Lifecycle status of a channel plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Not started, or finished.
    Stopped,
    /// Resolving credentials / identity.
    Starting,
    /// Polling or otherwise processing messages.
    Running,
    /// Start-up failed.
    Error(String),
}

/// Provider identifier of a message posted through [`Channel::send`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

/// The trait every channel plugin implements.
///
/// The host calls [`start`](Channel::start) once, in its own task, and
/// it runs until the token is cancelled. [`send`](Channel::send) may be
/// called concurrently from other tasks.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel identifier.
    fn name(&self) -> &str;

    fn metadata(&self) -> ChannelMetadata;

    fn status(&self) -> ChannelStatus;

    /// Receive messages until `cancel` fires, handing each one to
    /// [`ChannelHost::deliver_inbound`].
    async fn start(
        &self,
        host: Arc<dyn ChannelHost>,
        cancel: CancellationToken,
    ) -> Result<(), ChannelError>;

    /// Post an outbound message.
    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, ChannelError>;
}

/// The host side of the plugin boundary.
///
/// Errors returned from [`deliver_inbound`](ChannelHost::deliver_inbound)
/// are the host's problem: channels log them and carry on with the next
/// message.
#[async_trait]
pub trait ChannelHost: Send + Sync {
    async fn deliver_inbound(&self, msg: InboundMessage) -> Result<(), ChannelError>;
}

/// Builds [`Channel`] instances from JSON configuration.
pub trait ChannelFactory: Send + Sync {
    /// The channel name this factory creates.
    fn channel_name(&self) -> &str;

    fn build(&self, config: &serde_json::Value) -> Result<Arc<dyn Channel>, ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_status_equality() {
        assert_eq!(ChannelStatus::Running, ChannelStatus::Running);
        assert_ne!(ChannelStatus::Stopped, ChannelStatus::Starting);
        assert_eq!(
            ChannelStatus::Error("invalid_auth".into()),
            ChannelStatus::Error("invalid_auth".into()),
        );
        assert_ne!(
            ChannelStatus::Error("a".into()),
            ChannelStatus::Error("b".into()),
        );
    }

    #[test]
    fn message_id_hashes_by_value() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(MessageId("1700000000.000100".into()));
        assert!(set.contains(&MessageId("1700000000.000100".into())));
        assert!(!set.contains(&MessageId("1700000000.000200".into())));
    }
}
