//! Slack channel plugin.
//!
//! Provides a [`Channel`](crate::traits::Channel) implementation that
//! discovers messages by polling the Slack Web API. The plugin is
//! registered with the host through [`SlackChannelFactory`].
//!
//! # Modules
//!
//! - [`types`] -- Web API response types
//! - [`api`] -- HTTP client wrapper for the Slack Web API
//! - [`poll`] -- enumeration, filtering, dedup and the poll loop
//! - [`channel`] -- `Channel` trait implementation
//! - [`factory`] -- `ChannelFactory` implementation

pub mod api;
pub mod channel;
pub mod factory;
pub mod poll;
pub mod types;

pub use channel::SlackChannel;
pub use factory::SlackChannelFactory;
