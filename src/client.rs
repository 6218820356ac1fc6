//! Client-side orchestration of the x402 exchange

use crate::proof::ProofBuilder;
use crate::types::{PaymentRequirementsResponse, X_PAYMENT_HEADER};
use crate::{Result, X402Error};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Default timeout for resource-server requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client driving the x402 challenge/response exchange
///
/// One invocation performs at most two requests: the initial GET and, if the
/// server answers 402, a single retry carrying a freshly built proof. The
/// retry's response is returned as-is; there is no loop and no re-challenge
/// handling.
#[derive(Debug, Clone)]
pub struct X402Client {
    /// Underlying HTTP client
    client: Client,
}

impl X402Client {
    /// Create a new x402 client with the default timeout
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Create an x402 client over an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch a protected resource, paying for it if challenged
    ///
    /// Issues a bare GET first. Any status other than 402 ends the exchange
    /// and its body is returned. On a 402, the first listed payment
    /// requirement is handed to the proof builder and the request is retried
    /// once with the `X-PAYMENT` header; the second response's body is
    /// returned regardless of its status.
    pub async fn fetch_with_payment(
        &self,
        url: &str,
        builder: &ProofBuilder,
    ) -> Result<Value> {
        let first = self.client.get(url).send().await?;

        if first.status() != StatusCode::PAYMENT_REQUIRED {
            tracing::debug!(%url, status = %first.status(), "resource released without payment");
            return Ok(first.json().await?);
        }

        let challenge: PaymentRequirementsResponse = first.json().await?;
        let requirements = challenge
            .accepts
            .first()
            .ok_or(X402Error::NoPaymentOptions)?;

        tracing::info!(
            %url,
            scheme = %requirements.scheme,
            network = %requirements.network,
            amount = %requirements.amount,
            asset = %requirements.asset,
            "payment required, building proof"
        );

        let payload = builder.build(requirements).await?;
        let header = payload.to_base64()?;

        let second = self
            .client
            .get(url)
            .header(X_PAYMENT_HEADER, header)
            .send()
            .await?;

        tracing::info!(%url, status = %second.status(), "retry with payment completed");

        Ok(second.json().await?)
    }
}

impl Default for X402Client {
    fn default() -> Self {
        Self::new()
    }
}
