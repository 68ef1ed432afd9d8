//! [`PluginHost`] -- owns channel plugins and their running tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use parley_types::error::ChannelError;
use parley_types::event::OutboundMessage;

use crate::traits::*;

/// How often [`PluginHost::wait_for_startup`] re-checks channel status.
const STARTUP_CHECK_INTERVAL: Duration = Duration::from_millis(25);

/// A started channel: the token that stops it and the task running it.
struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registers factories, builds channels from config, and starts/stops
/// each channel in its own tokio task.
///
/// One channel instance corresponds to one connected account, so each
/// gets independent state (for Slack, its own dedup ledger).
pub struct PluginHost {
    factories: RwLock<HashMap<String, Arc<dyn ChannelFactory>>>,
    channels: RwLock<HashMap<String, Arc<dyn Channel>>>,
    running: Mutex<HashMap<String, RunningTask>>,
    sink: Arc<dyn ChannelHost>,
}

impl PluginHost {
    /// Create a host that delivers inbound messages to `sink`.
    pub fn new(sink: Arc<dyn ChannelHost>) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Register a factory, replacing any previous one with the same name.
    pub async fn register_factory(&self, factory: Arc<dyn ChannelFactory>) {
        let name = factory.channel_name().to_owned();
        info!(channel = %name, "registering channel factory");
        self.factories.write().await.insert(name, factory);
    }

    /// Build the channel `name` from its config section. Does not start it.
    pub async fn init_channel(
        &self,
        name: &str,
        config: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        let channel = {
            let factories = self.factories.read().await;
            let factory = factories
                .get(name)
                .ok_or_else(|| ChannelError::NotFound(name.to_owned()))?;
            factory.build(config)?
        };
        info!(channel = %name, "channel initialized");
        self.channels.write().await.insert(name.to_owned(), channel);
        Ok(())
    }

    /// Spawn [`Channel::start`] for `name` with a fresh cancellation token.
    ///
    /// Starting a channel that is already running is a no-op.
    pub async fn start_channel(&self, name: &str) -> Result<(), ChannelError> {
        let channel = self
            .channels
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ChannelError::NotFound(name.to_owned()))?;

        let mut running = self.running.lock().await;
        if running.contains_key(name) {
            warn!(channel = %name, "channel already running");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let sink = self.sink.clone();
        let channel_name = name.to_owned();

        let handle = tokio::spawn(async move {
            info!(channel = %channel_name, "starting channel");
            match channel.start(sink, task_cancel).await {
                Ok(()) => info!(channel = %channel_name, "channel stopped"),
                Err(e) => error!(channel = %channel_name, error = %e, "channel exited with error"),
            }
        });

        running.insert(name.to_owned(), RunningTask { cancel, handle });
        Ok(())
    }

    /// Start every initialized channel, reporting per-channel results.
    pub async fn start_all(&self) -> Vec<(String, Result<(), ChannelError>)> {
        let names = self.active_channels().await;
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let result = self.start_channel(&name).await;
            results.push((name, result));
        }
        results
    }

    /// Wait until every started channel is running or its task has exited,
    /// giving up after `timeout`.
    ///
    /// [`start_channel`](Self::start_channel) returns as soon as the task
    /// is spawned, so start-up failures (for Slack, identity resolution)
    /// only show up here, as a non-`Running` status.
    pub async fn wait_for_startup(&self, timeout: Duration) -> HashMap<String, ChannelStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        while !self.still_starting().await.is_empty() {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(STARTUP_CHECK_INTERVAL).await;
        }
        self.get_status().await
    }

    /// Started channels whose task is alive but not yet `Running`.
    async fn still_starting(&self) -> Vec<String> {
        let channels = self.channels.read().await;
        let running = self.running.lock().await;
        running
            .iter()
            .filter(|(name, task)| {
                !task.handle.is_finished()
                    && channels
                        .get(name.as_str())
                        .is_some_and(|ch| ch.status() != ChannelStatus::Running)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Cancel the channel's token and wait for its task to finish.
    pub async fn stop_channel(&self, name: &str) -> Result<(), ChannelError> {
        let task = self
            .running
            .lock()
            .await
            .remove(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_owned()))?;

        info!(channel = %name, "stopping channel");
        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!(channel = %name, error = %e, "channel task panicked");
        }
        Ok(())
    }

    /// Stop every running channel.
    pub async fn stop_all(&self) -> Vec<(String, Result<(), ChannelError>)> {
        let names: Vec<String> = self.running.lock().await.keys().cloned().collect();
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let result = self.stop_channel(&name).await;
            results.push((name, result));
        }
        results
    }

    /// Route an outbound message to the channel it names.
    pub async fn send_to_channel(&self, msg: &OutboundMessage) -> Result<MessageId, ChannelError> {
        let channel = self
            .channels
            .read()
            .await
            .get(&msg.channel)
            .cloned()
            .ok_or_else(|| ChannelError::NotFound(msg.channel.clone()))?;
        channel.send(msg).await
    }

    /// Status of every initialized channel.
    pub async fn get_status(&self) -> HashMap<String, ChannelStatus> {
        self.channels
            .read()
            .await
            .iter()
            .map(|(name, ch)| (name.clone(), ch.status()))
            .collect()
    }

    /// Names of the initialized channels.
    pub async fn active_channels(&self) -> Vec<String> {
        self.channels.read().await.keys().cloned().collect()
    }
}
