//! # parley-types
//!
//! Types shared by every parley crate:
//!
//! - **[`error`]** -- [`ParleyError`] and [`ChannelError`]
//! - **[`config`]** -- configuration schema, including the Slack poller settings
//! - **[`event`]** -- inbound/outbound message events exchanged with the host
//! - **[`secret`]** -- [`SecretString`](secret::SecretString) for credentials

pub mod config;
pub mod error;
pub mod event;
pub mod secret;

pub use error::{ChannelError, ParleyError, Result};
