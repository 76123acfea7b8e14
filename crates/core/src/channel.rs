//! Channel trait — the abstraction over chat platforms.
//!
//! A channel adapter connects NanoClaw to a messaging platform. Inbound
//! traffic goes onto the message bus as `InboundMessage`s; outbound traffic
//! comes back to the adapter through `send()` via the outbound dispatcher.

use crate::error::ChannelError;
use crate::message::OutboundMessage;
use async_trait::async_trait;

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic, message
/// formatting, and allowlisting. They publish inbound messages to the bus
/// themselves and never talk to the agent loop directly.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name, used as the routing key on the bus ("cli", "telegram").
    fn name(&self) -> &str;

    /// Start listening for incoming messages. Long-running: returns when
    /// the underlying platform connection closes or `stop()` is called.
    async fn start(&self) -> std::result::Result<(), ChannelError>;

    /// Deliver one outbound message to the platform.
    async fn send(&self, msg: &OutboundMessage) -> std::result::Result<(), ChannelError>;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Check if a sender is allowed (allowlist check). Empty allowlist
    /// semantics are adapter-specific; the default permits everyone.
    fn is_allowed(&self, _sender_id: &str) -> bool {
        true
    }
}
