use crate::channel::{tracked_channel, TrackedReceiver};
use crate::metrics::ChannelMetrics;
use crate::source::{LogSource, LogSubscription};
use alloy::rpc::types::Log;
use anyhow::Result;
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{info, warn};

/// Long-lived subscription whose logs are forwarded, in delivery order, into
/// a tracked channel. The receiver yields `None` once the node stops
/// delivering, which is how a dropped connection surfaces to the caller.
pub struct LogForwarder {
    source: Arc<dyn LogSource>,
    subscription: LogSubscription,
    channel_size: usize,
    metrics: Option<ChannelMetrics>,
}

impl LogForwarder {
    pub fn new(
        source: Arc<dyn LogSource>,
        subscription: LogSubscription,
        channel_size: usize,
        metrics: Option<ChannelMetrics>,
    ) -> Self {
        Self {
            source,
            subscription,
            channel_size,
            metrics,
        }
    }

    pub async fn spawn(self) -> Result<TrackedReceiver<Log>> {
        let (tx, rx) = tracked_channel(self.channel_size, self.metrics.clone());
        let mut stream = self.source.subscribe(self.subscription).await?;
        let address = self.subscription.address;
        info!(%address, "log subscription established");

        tokio::spawn(async move {
            while let Some(log) = stream.next().await {
                if tx.send(log).await.is_err() {
                    warn!(%address, "log receiver dropped");
                    return;
                }
            }
            warn!(%address, "log subscription ended");
        });

        Ok(rx)
    }
}
