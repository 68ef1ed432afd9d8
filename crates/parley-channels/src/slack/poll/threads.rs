//! Thread activity detection.

use super::model::{ChannelDescriptor, RawMessage, SlackTs, ThreadCandidate};

/// Top-level messages in `batch` whose threads saw a reply at or after
/// `watermark`.
///
/// Parents are detected by `reply_count > 0`; threads whose latest
/// reply predates the watermark are left alone, so their replies are
/// never fetched.
pub fn thread_candidates(
    channel: &ChannelDescriptor,
    batch: &[RawMessage],
    watermark: SlackTs,
) -> Vec<ThreadCandidate> {
    batch
        .iter()
        .filter(|m| m.is_top_level() && m.reply_count > 0 && !m.id.is_empty())
        .filter(|m| {
            m.latest_reply_id
                .as_deref()
                .and_then(SlackTs::parse)
                .is_some_and(|latest| latest >= watermark)
        })
        .map(|m| ThreadCandidate {
            channel_id: channel.id.clone(),
            thread_parent_id: m.id.clone(),
            kind: channel.kind,
        })
        .collect()
}
