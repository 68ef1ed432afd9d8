//! Channel plugin system for parley.
//!
//! Each chat channel implements the [`Channel`] trait and is built by a
//! [`ChannelFactory`]. The [`PluginHost`] owns the running channels,
//! one tokio task and one [`CancellationToken`] per channel, and routes
//! outbound messages to them.
//!
//! ```text
//! ChannelFactory ──build()──> Arc<dyn Channel>
//!                                 │
//!                     PluginHost.init_channel()
//!                                 │
//!                     PluginHost.start_channel()
//!                           │           │
//!                   CancellationToken   Arc<dyn ChannelHost>
//!                           │           │
//!                     Channel::start(host, cancel)
//! ```
//!
//! The only channel shipped today is [`slack`], which discovers messages
//! by polling the Slack Web API rather than holding a socket open.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod host;
pub mod slack;
pub mod traits;

pub use host::PluginHost;
pub use traits::*;

pub use parley_types::error::ChannelError;
