//! Remote custodial signing for payment transactions
//!
//! The agent never holds key material; serialized transactions are sent to a
//! managed wallet service which returns the signed bytes.

use crate::{Result, X402Error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for signing calls
pub const DEFAULT_SIGNING_TIMEOUT: Duration = Duration::from_secs(30);

/// Service that signs serialized transactions on behalf of an address
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign a base64-encoded serialized transaction for the given address
    ///
    /// Returns the signed transaction, base64-encoded.
    async fn sign_transaction(&self, address: &str, transaction: &str) -> Result<String>;
}

/// Request body sent to the wallet service
#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    address: &'a str,
    transaction: &'a str,
}

/// Response body returned by the wallet service
#[derive(Debug, Deserialize)]
struct SignResponse {
    /// The signed transaction, base64-encoded
    signature: String,
}

/// HTTP client for a custodial wallet signing service
#[derive(Clone)]
pub struct WalletSignerClient {
    /// Base URL of the signing service
    url: String,
    /// HTTP client
    client: Client,
    /// Optional bearer token for the service
    auth_token: Option<String>,
}

impl std::fmt::Debug for WalletSignerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSignerClient")
            .field("url", &self.url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WalletSignerClient {
    /// Create a new signing service client
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_SIGNING_TIMEOUT)
            .build()
            .map_err(|e| X402Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            auth_token: None,
        })
    }

    /// Set a bearer token for authenticating with the service
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Get the base URL of this signing service
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TransactionSigner for WalletSignerClient {
    async fn sign_transaction(&self, address: &str, transaction: &str) -> Result<String> {
        let mut request = self
            .client
            .post(format!("{}/sign", self.url))
            .json(&SignRequest {
                address,
                transaction,
            });

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            X402Error::upstream_unavailable(format!("Signing service unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(X402Error::signing_failed(format!(
                "signing service returned status {}: {}",
                status, detail
            )));
        }

        let signed: SignResponse = response.json().await.map_err(|e| {
            X402Error::signing_failed(format!("signing service response was malformed: {}", e))
        })?;

        tracing::debug!(%address, "transaction signed by wallet service");

        Ok(signed.signature)
    }
}
