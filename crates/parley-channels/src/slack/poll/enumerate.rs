//! Channel enumeration.

use tracing::debug;

use super::model::{ChannelDescriptor, ChannelKind};
use super::{ConversationSource, log_provider_error};

/// List every conversation the identity belongs to, one request per
/// [`ChannelKind`].
///
/// A kind that fails is logged and left out; the kinds that succeeded
/// are still returned so one broken category does not stall the poller.
pub async fn enumerate_channels(source: &dyn ConversationSource) -> Vec<ChannelDescriptor> {
    let mut channels = Vec::new();
    for kind in ChannelKind::ALL {
        match source.list_channels(kind).await {
            Ok(found) => {
                debug!(kind = kind.slack_type(), count = found.len(), "listed channels");
                channels.extend(found);
            }
            Err(e) => log_provider_error(&e, "channel listing failed", kind.slack_type()),
        }
    }
    channels
}
