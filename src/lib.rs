//! # x402-solana - HTTP-native micropayments on Solana
//!
//! A Rust implementation of the x402 protocol for a Solana-based
//! agent-to-server exchange: a server meters an endpoint behind a payment
//! guard, and a client agent discovers the payment terms from the 402
//! challenge, constructs and remotely signs a Solana transaction, and
//! retries the request with the proof in the `X-PAYMENT` header.

pub mod client;
pub mod error;
pub mod guard;
pub mod proof;
pub mod rpc;
pub mod signer;
pub mod types;

// Re-exports for convenience
pub use client::X402Client;
pub use error::{Result, X402Error};
pub use guard::{GuardConfig, PaymentGuard, VerifiedPayment};
pub use proof::ProofBuilder;
pub use rpc::{BlockhashProvider, SolanaRpcClient};
pub use signer::{TransactionSigner, WalletSignerClient};
pub use types::*;

// Feature-gated framework support
#[cfg(feature = "axum")]
pub mod axum;

/// Current version of the x402-solana library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
