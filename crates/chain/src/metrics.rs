use anyhow::Result;
use prometheus::{IntCounter, IntGauge, Opts, Registry};

/// Gauges for one forwarded log subscription, labelled by the event it
/// carries (`pair_created` for the factory stream).
#[derive(Clone)]
pub struct ChannelMetrics {
    queue_depth: IntGauge,
    delivered_total: IntCounter,
}

impl ChannelMetrics {
    pub fn new(registry: &Registry, event: &str) -> Result<Self> {
        let queue_depth = IntGauge::with_opts(Opts::new(
            format!("pairwatch_{event}_queue_depth"),
            format!("{event} logs forwarded from the node subscription and not yet decoded"),
        ))?;
        let delivered_total = IntCounter::with_opts(Opts::new(
            format!("pairwatch_{event}_delivered_total"),
            format!("{event} logs forwarded from the node subscription since startup"),
        ))?;

        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(delivered_total.clone()))?;

        Ok(Self {
            queue_depth,
            delivered_total,
        })
    }

    pub fn set_queue_depth(&self, depth: usize) {
        self.queue_depth.set(depth as i64);
    }

    pub fn inc_delivered(&self) {
        self.delivered_total.inc();
    }
}
