//! Error types for parley.
//!
//! [`ChannelError`] is what channel plugins return from every fallible
//! operation. [`ParleyError`] covers configuration that cannot be
//! parsed or does not validate.

use thiserror::Error;

/// Configuration error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParleyError {
    /// Configuration parsed but holds out-of-range values.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The configuration JSON does not match the schema.
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Channel-specific error type.
///
/// Provider responses are folded into the message text verbatim (for
/// Slack, the `error` field of a failed Web API call), so callers that
/// need to tell throttling apart from other failures inspect the
/// rendered message.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChannelError {
    /// Failed to reach the channel backend.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication / authorization was rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Sending a message failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receiving (listing, fetching history) failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The channel is not currently connected.
    #[error("not connected")]
    NotConnected,

    /// The requested channel was not found.
    #[error("channel not found: {0}")]
    NotFound(String),

    /// Catch-all for errors that do not fit other variants.
    #[error("{0}")]
    Other(String),
}

/// Result of loading or validating configuration.
pub type Result<T> = std::result::Result<T, ParleyError>;
