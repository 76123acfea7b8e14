//! Outbound dispatcher — routes agent responses back to their adapters.

use nanoclaw_bus::MessageBus;
use nanoclaw_core::channel::Channel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Consume the outbound queue forever, delivering each message through the
/// adapter whose name matches its `channel` field. Unknown channels and
/// delivery failures are logged and dropped; the dispatcher never stops.
pub async fn dispatch_outbound(bus: MessageBus, channels: Vec<Arc<dyn Channel>>) {
    let by_name: HashMap<String, Arc<dyn Channel>> = channels
        .into_iter()
        .map(|c| (c.name().to_string(), c))
        .collect();

    loop {
        let msg = bus.consume_outbound().await;
        let Some(channel) = by_name.get(&msg.channel) else {
            warn!(channel = %msg.channel, "No adapter for outbound message, dropping");
            continue;
        };
        debug!(channel = %msg.channel, chat_id = %msg.chat_id, "Dispatching outbound message");
        if let Err(e) = channel.send(&msg).await {
            error!(channel = %msg.channel, error = %e, "Outbound delivery failed");
        }
    }
}
