//! `parley watch` -- poll every enabled channel and print what arrives.
//!
//! Each delivered message is written to stdout as one JSON object per
//! line; logs go to stderr. Ctrl+C stops all channels and exits.
//!
//! # Example
//!
//! ```text
//! parley watch --config ~/.parley/config.json | jq .content
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Args;
use tracing::{error, info, warn};

use parley_channels::PluginHost;
use parley_channels::slack::SlackChannelFactory;
use parley_channels::traits::{ChannelHost, ChannelStatus};
use parley_types::error::ChannelError;
use parley_types::event::InboundMessage;

use super::{channel_section, load_config_value, parse_config};

/// Start-up wait on top of one request timeout.
const STARTUP_GRACE: Duration = Duration::from_secs(5);

/// Arguments for `parley watch`.
#[derive(Args)]
pub struct WatchArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Delivery sink that writes each message as a JSON line.
pub struct JsonLineSink<W> {
    out: std::sync::Mutex<W>,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: std::sync::Mutex::new(out),
        }
    }
}

#[async_trait]
impl<W: Write + Send> ChannelHost for JsonLineSink<W> {
    async fn deliver_inbound(&self, msg: InboundMessage) -> Result<(), ChannelError> {
        let line = serde_json::to_string(&msg)
            .map_err(|e| ChannelError::Other(format!("failed to encode message: {e}")))?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| ChannelError::Other("output lock poisoned".into()))?;
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| ChannelError::Other(format!("failed to write message: {e}")))
    }
}

/// Run the watch command until Ctrl+C.
pub async fn run(args: WatchArgs) -> anyhow::Result<()> {
    let raw = load_config_value(args.config.as_deref()).await?;
    let config = parse_config(raw.clone())?;

    let sink: Arc<dyn ChannelHost> = Arc::new(JsonLineSink::new(std::io::stdout()));
    let plugin_host = PluginHost::new(sink);

    let mut any_channel = false;

    // Slack
    if config.channels.slack.enabled {
        plugin_host
            .register_factory(Arc::new(SlackChannelFactory))
            .await;
        plugin_host
            .init_channel("slack", &channel_section(&raw, "slack"))
            .await
            .map_err(|e| anyhow::anyhow!("failed to init slack channel: {e}"))?;
        info!("slack channel initialized");
        any_channel = true;
    }

    if !any_channel {
        anyhow::bail!(
            "no channels are enabled in config. \
             Set channels.slack.enabled and provide a bot_token."
        );
    }

    let startup_timeout = config.channels.slack.request_timeout() + STARTUP_GRACE;
    start_channels(&plugin_host, startup_timeout).await?;

    info!("watching -- press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("received shutdown signal");

    for (name, result) in plugin_host.stop_all().await {
        match result {
            Ok(()) => info!(channel = %name, "channel stopped"),
            Err(e) => warn!(channel = %name, error = %e, "channel stop error"),
        }
    }

    for (name, status) in plugin_host.get_status().await {
        info!(channel = %name, status = ?status, "final status");
    }

    Ok(())
}

/// Start every initialized channel and wait for each to reach `Running`.
///
/// Fails, with every channel stopped again, when none of them does.
async fn start_channels(plugin_host: &PluginHost, timeout: Duration) -> anyhow::Result<()> {
    for (name, result) in plugin_host.start_all().await {
        if let Err(e) = result {
            error!(channel = %name, error = %e, "channel failed to start");
        }
    }

    let mut running = 0;
    for (name, status) in plugin_host.wait_for_startup(timeout).await {
        match status {
            ChannelStatus::Running => {
                info!(channel = %name, "channel started");
                running += 1;
            }
            ChannelStatus::Error(reason) => {
                error!(channel = %name, error = %reason, "channel failed to start");
            }
            other => warn!(channel = %name, status = ?other, "channel is not running"),
        }
    }

    if running == 0 {
        plugin_host.stop_all().await;
        anyhow::bail!("no channels started successfully");
    }
    Ok(())
}
