//! The message bus — sole transport between channel adapters and the agent.
//!
//! Two unbounded FIFO queues: inbound (adapters → agent loop) and outbound
//! (agent loop → adapters). Publishing never blocks and never fails;
//! consuming suspends until an item is available. No ordering is guaranteed
//! across the two queues, only within each.
//!
//! The bus is process-local. Nothing is replayed across restarts.

use nanoclaw_core::message::{InboundMessage, OutboundMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// The shared bus handle. Cheap to clone; all clones feed the same queues.
#[derive(Clone)]
pub struct MessageBus {
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: Arc<Mutex<mpsc::UnboundedReceiver<InboundMessage>>>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx: Arc<Mutex<mpsc::UnboundedReceiver<OutboundMessage>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx,
            inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            outbound_tx,
            outbound_rx: Arc::new(Mutex::new(outbound_rx)),
        }
    }

    /// Publish a message for the agent loop. Never blocks.
    pub fn publish_inbound(&self, msg: InboundMessage) {
        debug!(channel = %msg.channel, sender = %msg.sender_id, "Publishing inbound message");
        // The receiver lives as long as the bus itself, so send cannot fail
        // while any handle exists.
        let _ = self.inbound_tx.send(msg);
    }

    /// Receive the next inbound message, suspending until one is available.
    ///
    /// Intended for a single consumer (the agent loop); if multiple tasks
    /// consume concurrently, each message is still delivered exactly once.
    pub async fn consume_inbound(&self) -> InboundMessage {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .unwrap_or_else(|| unreachable!("bus holds its own sender; channel cannot close"))
    }

    /// Publish a response for a channel adapter. Never blocks.
    pub fn publish_outbound(&self, msg: OutboundMessage) {
        debug!(channel = %msg.channel, chat = %msg.chat_id, "Publishing outbound message");
        let _ = self.outbound_tx.send(msg);
    }

    /// Receive the next outbound message, suspending until one is available.
    pub async fn consume_outbound(&self) -> OutboundMessage {
        let mut rx = self.outbound_rx.lock().await;
        rx.recv()
            .await
            .unwrap_or_else(|| unreachable!("bus holds its own sender; channel cannot close"))
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn inbound_fifo_order() {
        let bus = MessageBus::new();
        bus.publish_inbound(InboundMessage::new("cli", "u", "c", "first"));
        bus.publish_inbound(InboundMessage::new("cli", "u", "c", "second"));
        bus.publish_inbound(InboundMessage::new("cli", "u", "c", "third"));

        assert_eq!(bus.consume_inbound().await.content, "first");
        assert_eq!(bus.consume_inbound().await.content, "second");
        assert_eq!(bus.consume_inbound().await.content, "third");
    }

    #[tokio::test]
    async fn queues_are_independent() {
        let bus = MessageBus::new();
        bus.publish_outbound(OutboundMessage::new("cli", "c", "reply"));
        bus.publish_inbound(InboundMessage::new("cli", "u", "c", "hello"));

        // Consuming one queue does not disturb the other.
        assert_eq!(bus.consume_outbound().await.content, "reply");
        assert_eq!(bus.consume_inbound().await.content, "hello");
    }

    #[tokio::test]
    async fn consume_suspends_until_publish() {
        let bus = MessageBus::new();
        let consumer = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.consume_inbound().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        bus.publish_inbound(InboundMessage::new("cli", "u", "c", "wake up"));
        let msg = consumer.await.unwrap();
        assert_eq!(msg.content, "wake up");
    }

    #[tokio::test]
    async fn clones_share_queues() {
        let bus = MessageBus::new();
        let other = bus.clone();
        other.publish_inbound(InboundMessage::new("cli", "u", "c", "via clone"));
        assert_eq!(bus.consume_inbound().await.content, "via clone");
    }
}
