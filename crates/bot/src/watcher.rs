use futures_util::stream::{select_with_strategy, PollNext, StreamExt};
use pairwatch_chain::{LogSource, LogStream};
use pairwatch_core::types::{WatchOutcome, WatchedPair};
use pairwatch_dex::{classify_liquidity_log, mint_subscription, transfer_subscription};
use std::sync::Arc;
use tokio::select;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Waits for the first sign of liquidity on one freshly created pair.
///
/// Mint, transfer and the timeout race; the first to fire decides the
/// outcome. A mint already queued beside a transfer wins. Both
/// subscriptions are owned by [`run`](Self::run) and are dropped before it
/// returns, on every path.
pub struct LiquidityWatcher {
    pair: WatchedPair,
    source: Arc<dyn LogSource>,
    window: Duration,
    cancel: CancellationToken,
}

impl LiquidityWatcher {
    pub fn new(
        pair: WatchedPair,
        source: Arc<dyn LogSource>,
        window: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pair,
            source,
            window,
            cancel,
        }
    }

    pub async fn run(self) -> WatchOutcome {
        let pair = self.pair.pair;
        let token = self.pair.target_token;
        let deadline = Instant::now() + self.window;

        let (mint, transfer) = match self.subscribe().await {
            Ok(streams) => streams,
            Err(err) => {
                warn!(%pair, %token, ?err, "liquidity subscription failed; abandoning pair");
                return WatchOutcome::SubscribeFailed;
            }
        };
        info!(%pair, %token, window_secs = self.window.as_secs(), "watching pair for liquidity");

        let mut signals = select_with_strategy(mint, transfer, |_: &mut ()| PollNext::Left);
        let outcome = loop {
            select! {
                biased;
                _ = self.cancel.cancelled() => break WatchOutcome::Cancelled,
                Some(log) = signals.next() => match classify_liquidity_log(&log) {
                    Some(signal) => break WatchOutcome::Liquidity(signal),
                    None => {
                        debug!(%pair, "ignoring unrecognized pair log");
                        continue;
                    }
                },
                _ = sleep_until(deadline) => break WatchOutcome::TimedOut,
            }
        };
        drop(signals);

        match outcome {
            WatchOutcome::Liquidity(signal) => {
                info!(%pair, %token, signal = signal.as_str(), "liquidity detected");
            }
            WatchOutcome::TimedOut => {
                info!(%pair, %token, "timeout; stopped listening to this pair");
            }
            _ => {
                info!(%pair, %token, outcome = outcome.as_str(), "stopped listening to this pair");
            }
        }
        outcome
    }

    async fn subscribe(&self) -> anyhow::Result<(LogStream, LogStream)> {
        let mint = self.source.subscribe(mint_subscription(self.pair.pair)).await?;
        let transfer = self
            .source
            .subscribe(transfer_subscription(self.pair.pair))
            .await?;
        Ok((mint, transfer))
    }
}
