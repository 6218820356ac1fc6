//! Error types for the x402-solana library

use thiserror::Error;

/// Result type alias for x402 operations
pub type Result<T> = std::result::Result<T, X402Error>;

/// Main error type for x402 operations
#[derive(Error, Debug)]
pub enum X402Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base64 encoding/decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Transaction encoding/decoding error
    #[error("Transaction encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    /// A payment requirements descriptor lacks required fields
    #[error("Malformed payment requirements: {message}")]
    MalformedRequirement { message: String },

    /// A 402 response was received but its `accepts` list is empty
    #[error("Server returned 402 but no payment requirements were listed")]
    NoPaymentOptions,

    /// The RPC service or another upstream dependency is unreachable
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// The signing service rejected the transaction
    #[error("Signing failed: {reason}")]
    SigningFailed { reason: String },

    /// The proof decoded but did not satisfy the payment requirements
    #[error("Payment proof rejected: {reason}")]
    ProofRejected { reason: String },

    /// Invalid payment payload
    #[error("Invalid payment payload: {message}")]
    InvalidPaymentPayload { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl X402Error {
    /// Create a malformed requirements error
    pub fn malformed_requirement(message: impl Into<String>) -> Self {
        Self::MalformedRequirement {
            message: message.into(),
        }
    }

    /// Create an upstream unavailable error
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a signing failed error
    pub fn signing_failed(reason: impl Into<String>) -> Self {
        Self::SigningFailed {
            reason: reason.into(),
        }
    }

    /// Create a proof rejected error
    pub fn proof_rejected(reason: impl Into<String>) -> Self {
        Self::ProofRejected {
            reason: reason.into(),
        }
    }

    /// Create an invalid payment payload error
    pub fn invalid_payment_payload(message: impl Into<String>) -> Self {
        Self::InvalidPaymentPayload {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status code an outer request handler should map this error to
    ///
    /// Distinguishes caller mistakes (400) from payment infrastructure being
    /// down (502/503) instead of collapsing everything into a 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedRequirement { .. }
            | Self::NoPaymentOptions
            | Self::InvalidPaymentPayload { .. }
            | Self::Json(_)
            | Self::Base64(_)
            | Self::Bincode(_) => 400,
            Self::ProofRejected { .. } => 402,
            Self::SigningFailed { .. } => 502,
            Self::UpstreamUnavailable { .. } => 503,
            Self::Http(_) | Self::Config { .. } => 500,
        }
    }
}
