//! Blockchain RPC access for transaction construction

use crate::{Result, X402Error};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use solana_sdk::hash::Hash;
use std::str::FromStr;
use std::time::Duration;

/// Default Solana RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default timeout for RPC calls
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of recent block references for transaction construction
///
/// The proof builder only needs a single read from the chain; anything that
/// can produce a recent blockhash satisfies it.
#[async_trait]
pub trait BlockhashProvider: Send + Sync {
    /// Fetch the latest blockhash
    async fn latest_blockhash(&self) -> Result<Hash>;
}

/// JSON-RPC client for the Solana `getLatestBlockhash` call
#[derive(Debug, Clone)]
pub struct SolanaRpcClient {
    /// Base URL of the RPC service
    url: String,
    /// HTTP client
    client: Client,
}

impl SolanaRpcClient {
    /// Create a new RPC client with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_RPC_TIMEOUT)
    }

    /// Create a new RPC client with a custom timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| X402Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a client for the public mainnet-beta endpoint
    pub fn mainnet() -> Result<Self> {
        Self::new(DEFAULT_RPC_URL)
    }

    /// Get the base URL of this RPC service
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BlockhashProvider for SolanaRpcClient {
    async fn latest_blockhash(&self) -> Result<Hash> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getLatestBlockhash",
            "params": [{"commitment": "finalized"}],
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| X402Error::upstream_unavailable(format!("RPC request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(X402Error::upstream_unavailable(format!(
                "RPC returned status: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            X402Error::upstream_unavailable(format!("RPC response was not JSON: {}", e))
        })?;

        let blockhash = body["result"]["value"]["blockhash"]
            .as_str()
            .ok_or_else(|| {
                X402Error::upstream_unavailable("RPC response carried no blockhash")
            })?;

        tracing::debug!(%blockhash, "fetched latest blockhash");

        Hash::from_str(blockhash).map_err(|e| {
            X402Error::upstream_unavailable(format!("RPC returned invalid blockhash: {}", e))
        })
    }
}
