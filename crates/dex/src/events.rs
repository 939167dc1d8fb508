use crate::abi::{IUniswapV2Factory, IUniswapV2Pair};
use alloy::primitives::Address;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use anyhow::Result;
use pairwatch_chain::LogSubscription;
use pairwatch_core::types::{LiquiditySignal, PairCreatedEvent};

pub fn pair_created_subscription(factory: Address) -> LogSubscription {
    LogSubscription::new(factory, IUniswapV2Factory::PairCreated::SIGNATURE_HASH)
}

pub fn mint_subscription(pair: Address) -> LogSubscription {
    LogSubscription::new(pair, IUniswapV2Pair::Mint::SIGNATURE_HASH)
}

pub fn transfer_subscription(pair: Address) -> LogSubscription {
    LogSubscription::new(pair, IUniswapV2Pair::Transfer::SIGNATURE_HASH)
}

pub fn decode_pair_created(log: &Log) -> Result<PairCreatedEvent> {
    let decoded = log.log_decode::<IUniswapV2Factory::PairCreated>()?;
    let event = decoded.inner.data;
    Ok(PairCreatedEvent {
        token0: event.token0,
        token1: event.token1,
        pair: event.pair,
    })
}

/// Maps a pair log to the liquidity signal it represents. The payload is
/// not inspected: the occurrence of the event is the signal.
pub fn classify_liquidity_log(log: &Log) -> Option<LiquiditySignal> {
    let topic0 = log.inner.data.topics().first()?;
    if *topic0 == IUniswapV2Pair::Mint::SIGNATURE_HASH {
        Some(LiquiditySignal::Mint)
    } else if *topic0 == IUniswapV2Pair::Transfer::SIGNATURE_HASH {
        Some(LiquiditySignal::Transfer)
    } else {
        None
    }
}
