//! Polling-mode message discovery.
//!
//! No socket is held open. Instead, every cycle the [`SlackPoller`]:
//!
//! 1. enumerates the conversations the identity belongs to
//!    ([`enumerate_channels`]),
//! 2. fetches the most recent history page of each, one channel at a time,
//! 3. runs every message through [`classify`] against the session's
//!    [`DedupLedger`] and the startup watermark,
//! 4. fetches replies for threads with post-watermark activity
//!    ([`thread_candidates`]),
//! 5. sleeps until the next cycle or cancellation.
//!
//! History pages overlap between cycles; the ledger is what keeps a
//! message from being delivered twice.

pub mod enumerate;
pub mod filter;
pub mod ledger;
pub mod model;
pub mod poller;
pub mod threads;

use async_trait::async_trait;
use tracing::{error, warn};

use parley_types::error::ChannelError;

pub use enumerate::enumerate_channels;
pub use filter::{FilterContext, SuppressReason, Verdict, classify};
pub use ledger::DedupLedger;
pub use model::{
    ChannelDescriptor, ChannelKind, NormalizedMessage, RawMessage, SlackTs, ThreadCandidate,
};
pub use poller::{CycleReport, PollPhase, PollSettings, SlackPoller};
pub use threads::thread_candidates;

/// Read access to a workspace's conversations.
///
/// Implemented by [`SlackApiClient`](crate::slack::api::SlackApiClient)
/// over the Web API; tests substitute an in-memory source.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    /// The authenticated identity's own user id.
    async fn auth_identity(&self) -> Result<String, ChannelError>;

    /// Every conversation of `kind` the identity is a member of, with
    /// provider pagination fully drained.
    async fn list_channels(&self, kind: ChannelKind) -> Result<Vec<ChannelDescriptor>, ChannelError>;

    /// The most recent `limit` messages of `channel`, newest first.
    async fn fetch_history(&self, channel: &str, limit: u32) -> Result<Vec<RawMessage>, ChannelError>;

    /// Up to `limit` messages of the thread rooted at `parent`, oldest
    /// first. Item 0 is the parent itself.
    async fn fetch_thread_replies(
        &self,
        channel: &str,
        parent: &str,
        limit: u32,
    ) -> Result<Vec<RawMessage>, ChannelError>;
}

/// Whether a provider error reports throttling.
pub fn is_rate_limited(err: &ChannelError) -> bool {
    let text = err.to_string().to_ascii_lowercase();
    [
        "ratelimited",
        "rate_limited",
        "rate limited",
        "http 429",
        "too many requests",
    ]
        .iter()
        .any(|marker| text.contains(marker))
}

/// Log a failed provider call: throttling at `warn`, anything else at `error`.
pub(crate) fn log_provider_error(err: &ChannelError, what: &str, scope: &str) {
    if is_rate_limited(err) {
        warn!(scope = %scope, error = %err, "{what}: rate limited, retrying next cycle");
    } else {
        error!(scope = %scope, error = %err, "{what}");
    }
}
