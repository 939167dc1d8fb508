use thiserror::Error;

/// Conditions that end the process with a non-zero status.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("streaming connection closed")]
    ConnectionClosed,
}
