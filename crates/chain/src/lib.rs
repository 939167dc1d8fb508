pub mod channel;
pub mod client;
pub mod metrics;
pub mod pairs;
pub mod source;

#[cfg(test)]
mod testing;

pub use channel::TrackedReceiver;
pub use client::NodeClient;
pub use metrics::ChannelMetrics;
pub use pairs::LogForwarder;
pub use source::{LogSource, LogStream, LogSubscription, WsLogSource};
