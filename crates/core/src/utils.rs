use alloy::primitives::Address;
use anyhow::anyhow;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Parses a hex address. Checksum casing is ignored, so two spellings of the
/// same address always compare equal once parsed.
pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    let trimmed = s.trim();
    let lowered = trimmed.to_ascii_lowercase();
    Address::from_str(&lowered).map_err(|e| anyhow!("invalid address {trimmed}: {e}"))
}

pub fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    let trimmed = s.trim();
    Decimal::from_str(trimmed).map_err(|e| anyhow!("invalid decimal {trimmed}: {e}"))
}
