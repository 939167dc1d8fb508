use crate::error::ExecutorError;
use crate::request::PurchaseRequest;
use anyhow::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// HTTP client for the external execution service. Each call is a single
/// attempt; nothing here retries.
#[derive(Clone)]
pub struct ExecutorClient {
    http: Client,
    buy_url: String,
}

impl ExecutorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let buy_url = format!("{}/buy", base_url.trim().trim_end_matches('/'));
        Ok(Self { http, buy_url })
    }

    pub fn buy_url(&self) -> &str {
        &self.buy_url
    }

    /// Posts the request and decodes the acknowledgment. The body is opaque
    /// JSON; only transport, status and decoding are checked.
    pub async fn buy(&self, request: &PurchaseRequest) -> Result<Value, ExecutorError> {
        let response = self.http.post(&self.buy_url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutorError::status(status.as_u16(), body));
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ExecutorError::Decode)
    }

    /// [`buy`](Self::buy) with the outcome logged. Failures stop here; the
    /// result is handed back for bookkeeping only.
    pub async fn submit(&self, request: &PurchaseRequest) -> Result<Value, ExecutorError> {
        let result = self.buy(request).await;
        match &result {
            Ok(body) => {
                info!(token = %request.target_token, response = %body, "executor response");
            }
            Err(err) => {
                error!(token = %request.target_token, %err, "error calling executor");
            }
        }
        result
    }
}
