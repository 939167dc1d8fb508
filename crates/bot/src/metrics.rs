use anyhow::Result;
use pairwatch_chain::ChannelMetrics;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

pub struct BotMetrics {
    registry: Registry,
    pub pair_logs: ChannelMetrics,
    pub pairs_seen: IntCounter,
    pub pairs_filtered: IntCounter,
    pub pairs_duplicate: IntCounter,
    pub pairs_malformed: IntCounter,
    pub watchers_active: IntGauge,
    pub liquidity_total: IntCounterVec,
    pub executor_requests_total: IntCounterVec,
}

impl BotMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let pair_logs = ChannelMetrics::new(&registry, "pair_created")?;
        let pairs_seen = IntCounter::with_opts(Opts::new(
            "pairwatch_pairs_seen_total",
            "Total PairCreated logs received",
        ))?;
        registry.register(Box::new(pairs_seen.clone()))?;
        let pairs_filtered = IntCounter::with_opts(Opts::new(
            "pairwatch_pairs_filtered_total",
            "Total pairs skipped by the reference-asset filter",
        ))?;
        registry.register(Box::new(pairs_filtered.clone()))?;
        let pairs_duplicate = IntCounter::with_opts(Opts::new(
            "pairwatch_pairs_duplicate_total",
            "Total pairs skipped because a watcher was already started",
        ))?;
        registry.register(Box::new(pairs_duplicate.clone()))?;
        let pairs_malformed = IntCounter::with_opts(Opts::new(
            "pairwatch_pairs_malformed_total",
            "Total PairCreated logs that failed to decode",
        ))?;
        registry.register(Box::new(pairs_malformed.clone()))?;
        let watchers_active = IntGauge::with_opts(Opts::new(
            "pairwatch_watchers_active",
            "Liquidity watchers currently waiting",
        ))?;
        registry.register(Box::new(watchers_active.clone()))?;
        let liquidity_total = IntCounterVec::new(
            Opts::new(
                "pairwatch_liquidity_total",
                "Watcher resolutions by outcome",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(liquidity_total.clone()))?;
        let executor_requests_total = IntCounterVec::new(
            Opts::new(
                "pairwatch_executor_requests_total",
                "Execution service calls by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(executor_requests_total.clone()))?;

        Ok(Self {
            registry,
            pair_logs,
            pairs_seen,
            pairs_filtered,
            pairs_duplicate,
            pairs_malformed,
            watchers_active,
            liquidity_total,
            executor_requests_total,
        })
    }

    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        let _ = encoder.encode(&mf, &mut buf);
        String::from_utf8_lossy(&buf).to_string()
    }
}

pub fn spawn_metrics_server(bind: &str, metrics: Arc<BotMetrics>) -> Result<()> {
    let listener = TcpListener::bind(bind)?;
    let bind = bind.to_string();
    thread::spawn(move || {
        info!(%bind, "metrics server listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = handle_connection(stream, &metrics) {
                        warn!(?err, "metrics server connection failed");
                    }
                }
                Err(err) => {
                    warn!(?err, "metrics server accept failed");
                }
            }
        }
    });
    Ok(())
}

fn handle_connection(mut stream: TcpStream, metrics: &BotMetrics) -> Result<()> {
    let mut buffer = [0u8; 512];
    let _ = stream.read(&mut buffer);
    let body = metrics.gather();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_exposes_counters() {
        let metrics = BotMetrics::new().unwrap();
        metrics.pairs_seen.inc();
        metrics.liquidity_total.with_label_values(&["mint"]).inc();
        metrics
            .executor_requests_total
            .with_label_values(&["status"])
            .inc();
        metrics.pair_logs.inc_delivered();

        let text = metrics.gather();
        assert!(text.contains("pairwatch_pairs_seen_total 1"));
        assert!(text.contains("pairwatch_liquidity_total{kind=\"mint\"} 1"));
        assert!(text.contains("pairwatch_executor_requests_total{outcome=\"status\"} 1"));
        assert!(text.contains("pairwatch_pair_created_delivered_total 1"));
    }

    #[test]
    fn serves_exposition_over_tcp() {
        let metrics = Arc::new(BotMetrics::new().unwrap());
        metrics.pairs_filtered.inc();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        spawn_metrics_server(&addr.to_string(), metrics).unwrap();

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"GET /metrics HTTP/1.1\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("pairwatch_pairs_filtered_total 1"));
    }
}
