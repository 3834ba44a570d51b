//! Channel abstraction for message I/O.

pub mod telegram;

pub use telegram::TelegramChannel;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::engine::{InboundEvent, OutboundAction};
use crate::error::ChannelError;

/// Stream of inbound events produced by a running channel.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A messaging transport: produces typed inbound events and performs the
/// engine's outbound actions.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logging.
    fn name(&self) -> &str;

    /// Start listening; returns the inbound event stream.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Perform one outbound action.
    async fn deliver(&self, action: OutboundAction) -> Result<(), ChannelError>;

    /// Verify the channel can reach its backend.
    async fn health_check(&self) -> Result<(), ChannelError>;

    /// Graceful shutdown.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}
