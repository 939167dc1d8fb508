use alloy::primitives::{Address, Log as PrimitiveLog, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use pairwatch_chain::{LogSource, LogStream, LogSubscription};
use pairwatch_dex::abi::{IUniswapV2Factory, IUniswapV2Pair};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// In-memory node: every emitted log fans out to the live subscriptions
/// whose address and topic match. Live subscriptions are counted through
/// the broadcast receiver count.
pub struct MockChain {
    sender: Mutex<Option<broadcast::Sender<Log>>>,
    fail_subscribe: bool,
}

impl MockChain {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender: Mutex::new(Some(sender)),
            fail_subscribe: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_subscribe: true,
            ..Self::new()
        }
    }

    /// Returns how many subscriptions received the log.
    pub fn emit(&self, log: Log) -> usize {
        let guard = self.sender.lock().unwrap();
        match guard.as_ref() {
            Some(sender) => sender.send(log).unwrap_or(0),
            None => 0,
        }
    }

    pub fn active(&self) -> usize {
        let guard = self.sender.lock().unwrap();
        guard.as_ref().map(|s| s.receiver_count()).unwrap_or(0)
    }

    /// Simulates the socket going away: every stream ends.
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }

    pub async fn wait_for_active(&self, expected: usize) {
        for _ in 0..500 {
            if self.active() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {expected} subscriptions, found {}", self.active());
    }
}

#[async_trait]
impl LogSource for MockChain {
    async fn subscribe(&self, subscription: LogSubscription) -> Result<LogStream> {
        if self.fail_subscribe {
            return Err(anyhow!("subscription refused"));
        }
        let receiver = {
            let guard = self.sender.lock().unwrap();
            match guard.as_ref() {
                Some(sender) => sender.subscribe(),
                None => return Err(anyhow!("connection closed")),
            }
        };
        let stream = futures_util::stream::unfold(receiver, move |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(log) if subscription.matches(&log) => return Some((log, receiver)),
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        Ok(stream.boxed())
    }
}

fn rpc_log<E: SolEvent>(address: Address, event: &E) -> Log {
    Log {
        inner: PrimitiveLog {
            address,
            data: event.encode_log_data(),
        },
        ..Default::default()
    }
}

pub fn pair_created_log(factory: Address, token0: Address, token1: Address, pair: Address) -> Log {
    rpc_log(
        factory,
        &IUniswapV2Factory::PairCreated {
            token0,
            token1,
            pair,
            pairCount: U256::from(1u64),
        },
    )
}

pub fn mint_log(pair: Address) -> Log {
    rpc_log(
        pair,
        &IUniswapV2Pair::Mint {
            sender: Address::ZERO,
            amount0: U256::from(1_000u64),
            amount1: U256::from(2_000u64),
        },
    )
}

pub fn transfer_log(pair: Address) -> Log {
    rpc_log(
        pair,
        &IUniswapV2Pair::Transfer {
            from: Address::ZERO,
            to: pair,
            value: U256::from(1u64),
        },
    )
}
