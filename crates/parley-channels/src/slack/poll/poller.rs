//! [`SlackPoller`] -- the cooperative poll loop for one account.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use parley_types::config::SlackConfig;
use parley_types::error::ChannelError;

use crate::traits::ChannelHost;

use super::enumerate::enumerate_channels;
use super::filter::{FilterContext, Verdict, classify};
use super::ledger::DedupLedger;
use super::model::{ChannelDescriptor, ChannelKind, NormalizedMessage, RawMessage, SlackTs};
use super::threads::thread_candidates;
use super::{ConversationSource, log_provider_error};

/// Tunables for one poller.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Sleep between cycles.
    pub interval: Duration,
    /// Page size for history fetches.
    pub history_limit: u32,
    /// Page size for thread reply fetches (includes the parent).
    pub thread_reply_limit: u32,
    /// Senders allowed through to the host. Empty = everyone.
    pub allow_from: Vec<String>,
}

impl PollSettings {
    pub fn from_config(config: &SlackConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            history_limit: config.history_limit,
            thread_reply_limit: config.thread_reply_limit,
            allow_from: config.allow_from.clone(),
        }
    }

    /// Whether `sender` may reach the host.
    pub fn allows(&self, sender: &str) -> bool {
        self.allow_from.is_empty() || self.allow_from.iter().any(|id| id == sender)
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&SlackConfig::default())
    }
}

/// Where the loop currently is.
///
/// `Idle -> Enumerating -> FetchingHistory -> Filtering -> FetchingThreads
/// -> Sleeping -> Enumerating ...`, ending in `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Enumerating,
    FetchingHistory,
    Filtering,
    FetchingThreads,
    Sleeping,
    Cancelled,
}

/// Counters for one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Channels enumerated.
    pub channels: usize,
    pub delivered: usize,
    pub suppressed: usize,
    pub skipped: usize,
    /// Failed history fetches, thread fetches and deliveries.
    pub failures: usize,
}

/// Polls one account's conversations and delivers new messages.
///
/// Owns the account's [`DedupLedger`] and watermark. Channels are
/// processed one at a time, so at most one provider request is in
/// flight.
pub struct SlackPoller {
    source: Arc<dyn ConversationSource>,
    self_id: String,
    settings: PollSettings,
    ledger: DedupLedger,
    watermark: Option<SlackTs>,
    phase: PollPhase,
}

impl SlackPoller {
    pub fn new(
        source: Arc<dyn ConversationSource>,
        self_id: impl Into<String>,
        settings: PollSettings,
    ) -> Self {
        Self {
            source,
            self_id: self_id.into(),
            settings,
            ledger: DedupLedger::new(),
            watermark: None,
            phase: PollPhase::Idle,
        }
    }

    /// Use a fixed watermark instead of the time the loop starts.
    pub fn with_watermark(mut self, watermark: SlackTs) -> Self {
        self.watermark = Some(watermark);
        self
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// The startup watermark, once captured.
    pub fn watermark(&self) -> Option<SlackTs> {
        self.watermark
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    fn begin(&mut self) -> SlackTs {
        *self.watermark.get_or_insert_with(SlackTs::now)
    }

    /// Poll until `cancel` fires.
    ///
    /// Cancellation is observed before each channel and interrupts the
    /// sleep between cycles immediately; an in-flight request is allowed
    /// to finish.
    pub async fn run(&mut self, host: &dyn ChannelHost, cancel: &CancellationToken) {
        let watermark = self.begin();
        info!(
            watermark = %watermark,
            interval_secs = self.settings.interval.as_secs(),
            "slack poller started"
        );

        while !cancel.is_cancelled() {
            let report = self.poll_once(host, cancel).await;
            debug!(?report, "poll cycle finished");

            self.phase = PollPhase::Sleeping;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        self.phase = PollPhase::Cancelled;
        info!(remembered = self.ledger.len(), "slack poller stopped");
    }

    /// Run a single cycle: enumerate, then poll each channel in turn.
    pub async fn poll_once(&mut self, host: &dyn ChannelHost, cancel: &CancellationToken) -> CycleReport {
        let watermark = self.begin();
        let mut report = CycleReport::default();

        self.phase = PollPhase::Enumerating;
        let channels = enumerate_channels(self.source.as_ref()).await;
        report.channels = channels.len();

        for channel in &channels {
            if cancel.is_cancelled() {
                debug!("cancellation requested, ending cycle early");
                break;
            }
            if let Err(e) = self.poll_channel(channel, watermark, host, &mut report).await {
                report.failures += 1;
                log_provider_error(&e, "history fetch failed", &channel.id);
            }
        }

        report
    }

    async fn poll_channel(
        &mut self,
        channel: &ChannelDescriptor,
        watermark: SlackTs,
        host: &dyn ChannelHost,
        report: &mut CycleReport,
    ) -> Result<(), ChannelError> {
        self.phase = PollPhase::FetchingHistory;
        let batch = self
            .source
            .fetch_history(&channel.id, self.settings.history_limit)
            .await?;

        // History is newest first; deliver in posting order.
        self.phase = PollPhase::Filtering;
        for message in batch.iter().rev() {
            self.handle(message, &channel.id, channel.kind, watermark, host, report)
                .await;
        }

        let candidates = thread_candidates(channel, &batch, watermark);
        if candidates.is_empty() {
            return Ok(());
        }

        self.phase = PollPhase::FetchingThreads;
        for candidate in candidates {
            let replies = match self
                .source
                .fetch_thread_replies(
                    &candidate.channel_id,
                    &candidate.thread_parent_id,
                    self.settings.thread_reply_limit,
                )
                .await
            {
                Ok(replies) => replies,
                Err(e) => {
                    report.failures += 1;
                    log_provider_error(&e, "thread fetch failed", &candidate.thread_parent_id);
                    continue;
                }
            };

            debug!(
                channel = %candidate.channel_id,
                thread_ts = %candidate.thread_parent_id,
                replies = replies.len().saturating_sub(1),
                "fetched thread"
            );

            // Item 0 is the parent, already handled from history.
            for mut reply in replies.into_iter().skip(1) {
                reply
                    .thread_parent_id
                    .get_or_insert_with(|| candidate.thread_parent_id.clone());
                self.handle(&reply, &candidate.channel_id, candidate.kind, watermark, host, report)
                    .await;
            }
        }

        Ok(())
    }

    async fn handle(
        &mut self,
        message: &RawMessage,
        channel: &str,
        kind: ChannelKind,
        watermark: SlackTs,
        host: &dyn ChannelHost,
        report: &mut CycleReport,
    ) {
        let ctx = FilterContext {
            watermark,
            self_id: &self.self_id,
            kind,
        };

        match classify(message, &ctx, &mut self.ledger) {
            Verdict::Skip => report.skipped += 1,
            Verdict::SuppressRemember => report.suppressed += 1,
            Verdict::Deliver => {
                let normalized = NormalizedMessage::from_raw(message, channel, kind);
                if !self.settings.allows(&normalized.sender) {
                    debug!(sender = %normalized.sender, channel = %channel, "sender not in allow_from, dropping");
                    report.suppressed += 1;
                    return;
                }

                debug!(channel = %channel, ts = %normalized.id, "delivering message");
                match host.deliver_inbound(normalized.into_inbound()).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        report.failures += 1;
                        error!(channel = %channel, ts = %message.id, error = %e, "delivery failed");
                    }
                }
            }
        }
    }
}
