use alloy::primitives::Address;
use anyhow::Result;
use pairwatch_core::AppConfig;
use rust_decimal::Decimal;
use serde::Serialize;

/// Body of `POST /buy`. Field order and names are the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRequest {
    pub target_token: String,
    #[serde(rename = "buy_amount_bnb")]
    pub buy_amount_native: Decimal,
    pub slippage: f64,
    #[serde(rename = "deadline_secs")]
    pub deadline_seconds: u64,
}

/// Process-wide purchase settings, resolved once from config.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseParams {
    pub buy_amount_native: Decimal,
    pub slippage: f64,
    pub deadline_seconds: u64,
}

impl PurchaseParams {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            buy_amount_native: cfg.buy_amount()?,
            slippage: cfg.executor.slippage,
            deadline_seconds: cfg.executor.deadline_secs,
        })
    }

    pub fn request_for(&self, target_token: Address) -> PurchaseRequest {
        PurchaseRequest {
            target_token: target_token.to_checksum(None),
            buy_amount_native: self.buy_amount_native,
            slippage: self.slippage,
            deadline_seconds: self.deadline_seconds,
        }
    }
}
