//! Core wire types for the x402 protocol on Solana

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// x402 protocol version
pub const X402_VERSION: u32 = 1;

/// Header carrying the base64-encoded payment proof
pub const X_PAYMENT_HEADER: &str = "X-PAYMENT";

/// Payment requirements for a resource
///
/// Issued by the server inside a 402 response; immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequirements {
    /// Payment scheme identifier (e.g., "exact")
    pub scheme: String,
    /// Blockchain network identifier (e.g., "solana", "solana-devnet")
    pub network: String,
    /// Recipient wallet address for the payment
    #[serde(rename = "payTo")]
    pub pay_to: String,
    /// Asset identifier (e.g., "USDC"); informational in this flow
    pub asset: String,
    /// Price as a decimal string, to avoid floating-point precision loss
    pub amount: String,
}

impl PaymentRequirements {
    /// Create a new payment requirements instance
    pub fn new(
        scheme: impl Into<String>,
        network: impl Into<String>,
        pay_to: impl Into<String>,
        asset: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            network: network.into(),
            pay_to: pay_to.into(),
            asset: asset.into(),
            amount: amount.into(),
        }
    }

    /// Get the amount as a decimal
    pub fn amount_as_decimal(&self) -> crate::Result<Decimal> {
        self.amount
            .parse()
            .map_err(|_| crate::X402Error::malformed_requirement("Invalid amount format"))
    }
}

/// Payment requirements response (HTTP 402 body)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequirementsResponse {
    /// Human-readable reason the payment is required or was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Ordered list of acceptable payment methods; the client picks the first
    pub accepts: Vec<PaymentRequirements>,
}

impl PaymentRequirementsResponse {
    /// Create a new payment requirements response
    pub fn new(error: impl Into<String>, accepts: Vec<PaymentRequirements>) -> Self {
        Self {
            error: Some(error.into()),
            accepts,
        }
    }
}

/// Payment proof sent back by the client in the `X-PAYMENT` header
///
/// Built once per payment attempt and never reused; the `payload` field
/// holds the base64 of the bincode-serialized Solana transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Protocol version identifier
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    /// Payment scheme identifier, copied from the chosen requirements
    pub scheme: String,
    /// Blockchain network identifier, copied from the chosen requirements
    pub network: String,
    /// Signed transaction, base64-encoded
    pub payload: String,
}

impl PaymentPayload {
    /// Create a new payment payload
    pub fn new(
        scheme: impl Into<String>,
        network: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            x402_version: X402_VERSION,
            scheme: scheme.into(),
            network: network.into(),
            payload: payload.into(),
        }
    }

    /// Decode a base64-encoded payment payload header value
    pub fn from_base64(encoded: &str) -> crate::Result<Self> {
        use base64::{engine::general_purpose, Engine as _};
        let decoded = general_purpose::STANDARD.decode(encoded)?;
        let payload: PaymentPayload = serde_json::from_slice(&decoded)?;
        Ok(payload)
    }

    /// Encode the payment payload to a base64 header value
    pub fn to_base64(&self) -> crate::Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        let json = serde_json::to_string(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}

/// Common network configurations
pub mod networks {
    /// Solana mainnet-beta
    pub const SOLANA_MAINNET: &str = "solana";
    /// Solana devnet
    pub const SOLANA_DEVNET: &str = "solana-devnet";

    /// Get the USDC mint address for a network
    pub fn get_usdc_mint(network: &str) -> Option<&'static str> {
        match network {
            SOLANA_MAINNET => Some("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            SOLANA_DEVNET => Some("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"),
            _ => None,
        }
    }

    /// Check if a network is supported
    pub fn is_supported(network: &str) -> bool {
        matches!(network, SOLANA_MAINNET | SOLANA_DEVNET)
    }
}

/// Common payment schemes
pub mod schemes {
    /// Exact payment scheme
    pub const EXACT: &str = "exact";
}
