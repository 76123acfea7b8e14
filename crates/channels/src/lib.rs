//! Channel adapters — the bridge between chat platforms and the bus.
//!
//! Each adapter publishes what it hears as `InboundMessage`s and delivers
//! `OutboundMessage`s handed to it by the dispatcher. The agent loop never
//! sees an adapter directly.

mod cli;
mod dispatcher;

pub use cli::CliChannel;
pub use dispatcher::dispatch_outbound;
