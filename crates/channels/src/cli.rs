//! CLI channel — interactive terminal chat over stdin/stdout.

use async_trait::async_trait;
use nanoclaw_bus::MessageBus;
use nanoclaw_core::channel::Channel;
use nanoclaw_core::error::ChannelError;
use nanoclaw_core::message::{InboundMessage, OutboundMessage};
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// Reads lines from stdin onto the bus; outbound content goes to stdout.
pub struct CliChannel {
    bus: MessageBus,
}

impl CliChannel {
    pub fn new(bus: MessageBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<(), ChannelError> {
        let stdin = io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
                        return Ok(());
                    }
                    self.bus
                        .publish_inbound(InboundMessage::new("cli", "user", "direct", line));
                }
                // EOF (Ctrl+D)
                Ok(None) => return Ok(()),
                Err(e) => return Err(ChannelError::ConnectionLost(e.to_string())),
            }
        }
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        println!("{}", msg.content);
        Ok(())
    }
}
