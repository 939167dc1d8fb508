pub mod abi;
pub mod events;
pub mod pair;

pub use events::{
    classify_liquidity_log,
    decode_pair_created,
    mint_subscription,
    pair_created_subscription,
    transfer_subscription,
};
pub use pair::{select_target, watch_pair};
