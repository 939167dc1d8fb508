use crate::error::FatalError;
use crate::metrics::{spawn_metrics_server, BotMetrics};
use crate::watcher::LiquidityWatcher;
use alloy::primitives::{Address, B256};
use alloy::rpc::types::Log;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use pairwatch_chain::{LogForwarder, LogSource, NodeClient, WsLogSource};
use pairwatch_core::config::AppConfig;
use pairwatch_core::dedupe::SeenSet;
use pairwatch_core::types::{WatchOutcome, WatchedPair};
use pairwatch_core::utils::{now_ms, parse_address};
use pairwatch_dex::{decode_pair_created, pair_created_subscription, watch_pair};
use pairwatch_executor::{ExecutorClient, PurchaseParams};
use std::str::FromStr;
use std::sync::Arc;
use tokio::select;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const PAIR_LOG_CHANNEL_SIZE: usize = 1024;

/// What happened to one watched pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub pair: WatchedPair,
    pub outcome: WatchOutcome,
    /// `None` when no purchase request was sent, otherwise whether the
    /// execution service accepted it.
    pub accepted: Option<bool>,
}

pub struct Bot {
    source: Arc<dyn LogSource>,
    factory: Address,
    reference: Option<Address>,
    purchase: PurchaseParams,
    executor: ExecutorClient,
    liquidity_window: Duration,
    seen: SeenSet<Address>,
    shutdown: CancellationToken,
    metrics: Option<Arc<BotMetrics>>,
}

impl Bot {
    pub async fn new(cfg: AppConfig) -> Result<Self> {
        if let Some(wallet) = load_wallet_address(&cfg.chain.private_key_env)? {
            info!(%wallet, "wallet loaded; signing is delegated to the executor");
        } else {
            warn!(env = %cfg.chain.private_key_env, "no signing key configured");
        }

        let chain = NodeClient::connect(&cfg.chain).await?;
        let source: Arc<dyn LogSource> = Arc::new(WsLogSource::new(chain.ws));
        let bot = Self::with_source(&cfg, source)?;

        if let Some(metrics) = &bot.metrics {
            spawn_metrics_server(&cfg.observability.metrics_bind, metrics.clone())?;
        }
        Ok(bot)
    }

    pub fn with_source(cfg: &AppConfig, source: Arc<dyn LogSource>) -> Result<Self> {
        let factory = parse_address(&cfg.dex.factory)?;
        let reference = cfg.wrapped_native().map(parse_address).transpose()?;
        if reference.is_none() {
            warn!("no reference asset configured; every new pair will be watched");
        }
        let purchase = PurchaseParams::from_config(cfg)?;
        let executor = ExecutorClient::new(
            &cfg.executor.url,
            Duration::from_millis(cfg.executor.request_timeout_ms),
        )?;
        let metrics = if cfg.observability.metrics_enabled {
            Some(Arc::new(BotMetrics::new()?))
        } else {
            None
        };

        Ok(Self {
            source,
            factory,
            reference,
            purchase,
            executor,
            liquidity_window: Duration::from_secs(cfg.watcher.liquidity_timeout_secs),
            seen: SeenSet::new(cfg.watcher.seen_capacity),
            shutdown: CancellationToken::new(),
            metrics,
        })
    }

    /// Cancelling this token stops [`run`](Self::run) with `Ok(())` and
    /// cancels every live watcher.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Listens for pair creation until shutdown or until the node stops
    /// delivering. The latter is fatal.
    pub async fn run(&mut self) -> Result<()> {
        let channel_metrics = self.metrics.as_ref().map(|m| m.pair_logs.clone());
        let mut pair_logs = LogForwarder::new(
            self.source.clone(),
            pair_created_subscription(self.factory),
            PAIR_LOG_CHANNEL_SIZE,
            channel_metrics,
        )
        .spawn()
        .await?;
        info!(factory = %self.factory, "listening for PairCreated events");

        loop {
            select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested; stopping listener");
                    return Ok(());
                }
                next = pair_logs.recv() => match next {
                    Some(log) => {
                        self.handle_pair_log(log);
                    }
                    None => {
                        error!("streaming connection closed");
                        self.shutdown.cancel();
                        return Err(FatalError::ConnectionClosed.into());
                    }
                },
            }
        }
    }

    /// Decodes and filters one factory log. Spawns a watcher for pairs worth
    /// tracking and returns its handle; every other case is logged and
    /// dropped.
    pub fn handle_pair_log(&mut self, log: Log) -> Option<JoinHandle<PairReport>> {
        if let Some(metrics) = &self.metrics {
            metrics.pairs_seen.inc();
        }
        let event = match decode_pair_created(&log) {
            Ok(event) => event,
            Err(err) => {
                warn!(?err, tx = ?log.transaction_hash, "malformed PairCreated log; skipping");
                if let Some(metrics) = &self.metrics {
                    metrics.pairs_malformed.inc();
                }
                return None;
            }
        };
        info!(
            token0 = %event.token0,
            token1 = %event.token1,
            pair = %event.pair,
            "PairCreated"
        );

        let Some(watched) = watch_pair(&event, self.reference, now_ms()) else {
            info!(pair = %event.pair, "not a reference-asset pair; skipping");
            if let Some(metrics) = &self.metrics {
                metrics.pairs_filtered.inc();
            }
            return None;
        };
        if !self.seen.first_sighting(watched.pair) {
            debug!(pair = %watched.pair, "pair already watched; skipping");
            if let Some(metrics) = &self.metrics {
                metrics.pairs_duplicate.inc();
            }
            return None;
        }

        Some(self.spawn_watcher(watched))
    }

    fn spawn_watcher(&self, pair: WatchedPair) -> JoinHandle<PairReport> {
        let watcher = LiquidityWatcher::new(
            pair,
            self.source.clone(),
            self.liquidity_window,
            self.shutdown.child_token(),
        );
        let purchase = self.purchase.clone();
        let executor = self.executor.clone();
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            if let Some(metrics) = &metrics {
                metrics.watchers_active.inc();
            }
            let outcome = watcher.run().await;
            if let Some(metrics) = &metrics {
                metrics.watchers_active.dec();
                metrics
                    .liquidity_total
                    .with_label_values(&[outcome.as_str()])
                    .inc();
            }

            let accepted = match outcome.liquidity() {
                Some(_) => {
                    let request = purchase.request_for(pair.target_token);
                    let result = executor.submit(&request).await;
                    if let Some(metrics) = &metrics {
                        let label = match &result {
                            Ok(_) => "ok",
                            Err(err) => err.kind(),
                        };
                        metrics
                            .executor_requests_total
                            .with_label_values(&[label])
                            .inc();
                    }
                    Some(result.is_ok())
                }
                None => None,
            };

            PairReport {
                pair,
                outcome,
                accepted,
            }
        })
    }
}

/// Parses the signing key if one is present. The key only proves the
/// deployment is wired to a wallet; nothing here signs with it.
fn load_wallet_address(env_name: &str) -> Result<Option<Address>> {
    let raw = match std::env::var(env_name) {
        Ok(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };
    let key = B256::from_str(raw.trim().trim_start_matches("0x"))?;
    let signer = PrivateKeySigner::from_bytes(&key)?;
    Ok(Some(signer.address()))
}
