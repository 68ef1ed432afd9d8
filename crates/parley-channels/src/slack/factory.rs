//! [`SlackChannelFactory`] -- creates Slack channels from JSON config.

use std::sync::Arc;

use parley_types::config::SlackConfig;
use parley_types::error::ChannelError;
use parley_types::secret::SecretString;

use crate::traits::{Channel, ChannelFactory};

use super::channel::SlackChannel;

/// Factory for creating [`SlackChannel`] instances from JSON configuration.
///
/// Expected config shape matches [`SlackConfig`]:
///
/// ```json
/// {
///   "enabled": true,
///   "bot_token": "xoxb-...",
///   "poll_interval_secs": 10,
///   "history_limit": 20,
///   "allow_from": ["U123"]
/// }
/// ```
pub struct SlackChannelFactory;

impl ChannelFactory for SlackChannelFactory {
    fn channel_name(&self) -> &str {
        "slack"
    }

    fn build(&self, config: &serde_json::Value) -> Result<Arc<dyn Channel>, ChannelError> {
        let mut slack_config: SlackConfig = serde_json::from_value(config.clone())
            .map_err(|e| ChannelError::Other(format!("invalid slack config: {e}")))?;

        // Resolve bot_token: explicit value > bot_token_env env var > error
        if slack_config.bot_token.is_empty() {
            if let Some(ref env_var) = slack_config.bot_token_env {
                match std::env::var(env_var) {
                    Ok(val) if !val.is_empty() => slack_config.bot_token = SecretString::new(val),
                    _ => {
                        return Err(ChannelError::Other(format!(
                            "slack bot_token_env '{env_var}' is not set or empty"
                        )));
                    }
                }
            } else {
                return Err(ChannelError::Other(
                    "missing 'bot_token' (or 'bot_token_env') in slack config".into(),
                ));
            }
        }

        slack_config
            .validate()
            .map_err(|e| ChannelError::Other(format!("slack: {e}")))?;

        Ok(Arc::new(SlackChannel::new(slack_config)?))
    }
}
