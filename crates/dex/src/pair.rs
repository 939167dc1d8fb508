use alloy::primitives::Address;
use pairwatch_core::types::{PairCreatedEvent, WatchedPair};

/// Picks the token to buy from a new pair.
///
/// With a reference asset configured, exactly one side must be the reference
/// and the other side is the target; anything else is not worth watching.
/// Without one, every pair is tracked and `token0` is the target.
pub fn select_target(event: &PairCreatedEvent, reference: Option<Address>) -> Option<Address> {
    let Some(reference) = reference else {
        return Some(event.token0);
    };
    match (event.token0 == reference, event.token1 == reference) {
        (true, false) => Some(event.token1),
        (false, true) => Some(event.token0),
        _ => None,
    }
}

pub fn watch_pair(
    event: &PairCreatedEvent,
    reference: Option<Address>,
    now_ms: u64,
) -> Option<WatchedPair> {
    select_target(event, reference).map(|target_token| WatchedPair {
        pair: event.pair,
        target_token,
        created_ms: now_ms,
    })
}
