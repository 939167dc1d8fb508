pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use error::FatalError;
pub use orchestrator::{Bot, PairReport};
pub use watcher::LiquidityWatcher;
