//! Message classification.
//!
//! [`classify`] decides, for every fetched message, whether it reaches the
//! host. Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. id already in the ledger -> [`Verdict::Skip`]
//! 2. sent by the polling identity -> suppress
//! 3. sent by a bot -> suppress
//! 4. blank text or any subtype (system event) -> suppress
//! 5. older than the watermark -> suppress
//! 6. in a channel (not a DM) without a `<@self>` mention -> suppress
//! 7. otherwise -> [`Verdict::Deliver`]
//!
//! Rule 1 comes first so that re-fetching an overlapping history window
//! changes nothing.

use tracing::trace;

use super::ledger::DedupLedger;
use super::model::{ChannelKind, RawMessage, SlackTs};

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand to the host. The id is now in the ledger.
    Deliver,
    /// Drop, and remember the id so it is never reconsidered.
    SuppressRemember,
    /// Already decided in an earlier fetch; nothing changes.
    Skip,
}

/// Why a message was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    OwnMessage,
    Bot,
    SystemOrEmpty,
    BeforeWatermark,
    NotMentioned,
}

impl SuppressReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OwnMessage => "own_message",
            Self::Bot => "bot",
            Self::SystemOrEmpty => "system_or_empty",
            Self::BeforeWatermark => "before_watermark",
            Self::NotMentioned => "not_mentioned",
        }
    }
}

/// Everything [`classify`] needs besides the message and the ledger.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub watermark: SlackTs,
    pub self_id: &'a str,
    /// Kind of the channel the message was fetched from (for thread
    /// replies, the parent's channel).
    pub kind: ChannelKind,
}

/// Classify `message`, recording its id unless the verdict is `Skip`.
pub fn classify(message: &RawMessage, ctx: &FilterContext<'_>, ledger: &mut DedupLedger) -> Verdict {
    if ledger.has(&message.id) {
        return Verdict::Skip;
    }

    let reason = suppression(message, ctx);
    ledger.add(&message.id);

    match reason {
        Some(reason) => {
            trace!(ts = %message.id, reason = reason.as_str(), "suppressed message");
            Verdict::SuppressRemember
        }
        None => Verdict::Deliver,
    }
}

/// Rules 2-7. `None` means deliver.
pub fn suppression(message: &RawMessage, ctx: &FilterContext<'_>) -> Option<SuppressReason> {
    if message.sender_id.as_deref() == Some(ctx.self_id) {
        return Some(SuppressReason::OwnMessage);
    }
    if message.is_bot || message.subtype.as_deref() == Some("bot_message") {
        return Some(SuppressReason::Bot);
    }
    let blank = message.text.as_deref().is_none_or(|t| t.trim().is_empty());
    if blank || message.subtype.is_some() {
        return Some(SuppressReason::SystemOrEmpty);
    }
    // An unreadable or missing ts cannot be placed after the watermark.
    if message.ts().is_none_or(|ts| ts < ctx.watermark) {
        return Some(SuppressReason::BeforeWatermark);
    }
    if ctx.kind.requires_mention() && !message.mentions(ctx.self_id) {
        return Some(SuppressReason::NotMentioned);
    }
    None
}
