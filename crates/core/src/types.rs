use alloy::primitives::Address;

/// Decoded `PairCreated(token0, token1, pair, uint)` log from the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCreatedEvent {
    pub token0: Address,
    pub token1: Address,
    pub pair: Address,
}

/// A pair that passed the reference-asset filter and is waiting for liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchedPair {
    pub pair: Address,
    pub target_token: Address,
    pub created_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquiditySignal {
    Mint,
    Transfer,
}

impl LiquiditySignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Liquidity(LiquiditySignal),
    TimedOut,
    Cancelled,
    SubscribeFailed,
}

impl WatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liquidity(signal) => signal.as_str(),
            Self::TimedOut => "timeout",
            Self::Cancelled => "cancelled",
            Self::SubscribeFailed => "subscribe_failed",
        }
    }

    pub fn liquidity(&self) -> Option<LiquiditySignal> {
        match self {
            Self::Liquidity(signal) => Some(*signal),
            _ => None,
        }
    }
}
