//! [`SlackChannel`] -- `Channel` trait implementation for Slack.
//!
//! Discovers messages by polling the Web API with a
//! [`SlackPoller`](super::poll::SlackPoller) and delivers them to the
//! pipeline through
//! [`ChannelHost::deliver_inbound`](crate::traits::ChannelHost::deliver_inbound).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use parley_types::config::SlackConfig;
use parley_types::error::ChannelError;
use parley_types::event::OutboundMessage;

use crate::traits::{Channel, ChannelHost, ChannelMetadata, ChannelStatus, MessageId};

use super::api::SlackApiClient;
use super::poll::{ConversationSource, PollSettings, SlackPoller};

/// Slack channel implementation using polling.
///
/// # Configuration
///
/// Created via [`SlackChannelFactory`](super::factory::SlackChannelFactory)
/// from the `SlackConfig` section of the global config.
pub struct SlackChannel {
    /// Slack Web API client (for sending messages).
    api: Arc<SlackApiClient>,
    /// Where polled conversations are read from.
    source: Arc<dyn ConversationSource>,
    /// Current lifecycle status.
    status: Arc<RwLock<ChannelStatus>>,
    /// Parsed configuration.
    config: SlackConfig,
}

impl SlackChannel {
    /// Create a new Slack channel from configuration.
    pub fn new(config: SlackConfig) -> Result<Self, ChannelError> {
        let api = Arc::new(SlackApiClient::new(
            config.bot_token.clone(),
            config.request_timeout(),
        )?);
        Ok(Self {
            source: api.clone(),
            api,
            status: Arc::new(RwLock::new(ChannelStatus::Stopped)),
            config,
        })
    }

    /// Create a channel that polls a custom [`ConversationSource`].
    pub fn with_source(
        config: SlackConfig,
        source: Arc<dyn ConversationSource>,
    ) -> Result<Self, ChannelError> {
        let mut channel = Self::new(config)?;
        channel.source = source;
        Ok(channel)
    }

    /// Set status under the write lock.
    async fn set_status(&self, status: ChannelStatus) {
        *self.status.write().await = status;
    }

    /// The polling identity: `bot_user_id` from config, else `auth.test`.
    async fn resolve_identity(&self) -> Result<String, ChannelError> {
        match self.config.bot_user_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id.to_owned()),
            _ => self.source.auth_identity().await,
        }
    }
}

#[async_trait]
impl Channel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn metadata(&self) -> ChannelMetadata {
        ChannelMetadata {
            name: "slack".into(),
            display_name: "Slack".into(),
            supports_threads: true,
        }
    }

    fn status(&self) -> ChannelStatus {
        self.status
            .try_read()
            .map(|s| s.clone())
            .unwrap_or(ChannelStatus::Stopped)
    }

    async fn start(
        &self,
        host: Arc<dyn ChannelHost>,
        cancel: CancellationToken,
    ) -> Result<(), ChannelError> {
        self.set_status(ChannelStatus::Starting).await;

        info!("Slack channel starting in polling mode");

        let self_id = match self.resolve_identity().await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "failed to resolve Slack identity");
                self.set_status(ChannelStatus::Error(e.to_string())).await;
                return Err(e);
            }
        };

        self.set_status(ChannelStatus::Running).await;
        info!(user_id = %self_id, "Slack identity resolved");

        let mut poller = SlackPoller::new(
            self.source.clone(),
            self_id,
            PollSettings::from_config(&self.config),
        );
        poller.run(host.as_ref(), &cancel).await;

        self.set_status(ChannelStatus::Stopped).await;
        info!("Slack channel stopped");
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, ChannelError> {
        let thread_ts = msg
            .metadata
            .get("thread_ts")
            .and_then(|v| v.as_str());

        let ts = self
            .api
            .chat_post_message(&msg.chat_id, &msg.content, thread_ts)
            .await?;

        Ok(MessageId(ts))
    }
}
