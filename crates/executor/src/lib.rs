pub mod client;
pub mod error;
pub mod request;

pub use client::ExecutorClient;
pub use error::ExecutorError;
pub use request::{PurchaseParams, PurchaseRequest};
