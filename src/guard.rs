//! Server-side payment guard
//!
//! Gates a protected operation behind proof of payment: advertises the
//! payment terms on a bare request and verifies the `X-PAYMENT` header on a
//! retry. Verification is local and side-effect free; the embedded
//! transaction is never broadcast, and no replay state is kept.

use crate::types::{
    networks, schemes, PaymentPayload, PaymentRequirements, PaymentRequirementsResponse,
    X402_VERSION,
};
use crate::{Result, X402Error};
use base64::{engine::general_purpose, Engine as _};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;

/// Configuration for the payment guard
///
/// Read-only after construction; built once at startup and injected rather
/// than read from ambient globals.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Recipient wallet address advertised to clients
    pub pay_to: Pubkey,
    /// Advertised price in decimal units (e.g., 0.01 for one cent)
    pub amount: Decimal,
    /// Asset identifier advertised to clients
    pub asset: String,
    /// Network the guard accepts proofs for
    pub network: String,
    /// Scheme the guard accepts proofs for
    pub scheme: String,
    /// Minimum lamports the embedded transfer must carry
    ///
    /// The demo proof is a nominal native transfer, so this is configured
    /// separately from the advertised token price.
    pub min_transfer_lamports: u64,
}

impl GuardConfig {
    /// Create a new guard config for USDC on Solana mainnet
    pub fn new(pay_to: Pubkey, amount: Decimal) -> Self {
        Self {
            pay_to,
            amount,
            asset: "USDC".to_string(),
            network: networks::SOLANA_MAINNET.to_string(),
            scheme: schemes::EXACT.to_string(),
            min_transfer_lamports: 1,
        }
    }

    /// Set the advertised asset
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = asset.into();
        self
    }

    /// Set the accepted network
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Set the accepted scheme
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the minimum lamports the embedded transfer must carry
    pub fn with_min_transfer_lamports(mut self, lamports: u64) -> Self {
        self.min_transfer_lamports = lamports;
        self
    }
}

/// Details extracted from an accepted payment proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    /// Fee payer of the embedded transaction
    pub payer: Pubkey,
    /// Lamports transferred to the configured recipient
    pub lamports: u64,
}

/// Gate for a payment-protected operation
#[derive(Debug, Clone)]
pub struct PaymentGuard {
    config: GuardConfig,
}

impl PaymentGuard {
    /// Create a new payment guard
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Get the guard configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// The single payment requirements descriptor this guard advertises
    pub fn payment_requirements(&self) -> PaymentRequirements {
        PaymentRequirements::new(
            &self.config.scheme,
            &self.config.network,
            self.config.pay_to.to_string(),
            &self.config.asset,
            self.config.amount.normalize().to_string(),
        )
    }

    /// The 402 body offered on a bare request or after a rejected proof
    pub fn challenge(&self, error: impl Into<String>) -> PaymentRequirementsResponse {
        PaymentRequirementsResponse::new(error, vec![self.payment_requirements()])
    }

    /// Verify an `X-PAYMENT` header value
    ///
    /// Decodes the proof, checks version, scheme and network against the
    /// configuration, verifies the embedded transaction's signatures against
    /// its message, and requires a System Program transfer to the configured
    /// recipient of at least `min_transfer_lamports`.
    pub fn verify(&self, header: &str) -> Result<VerifiedPayment> {
        let payload = PaymentPayload::from_base64(header)?;

        if payload.x402_version != X402_VERSION {
            return Err(X402Error::proof_rejected(format!(
                "unsupported x402 version: {}",
                payload.x402_version
            )));
        }
        if payload.scheme != self.config.scheme {
            return Err(X402Error::proof_rejected(format!(
                "scheme mismatch: expected {}, got {}",
                self.config.scheme, payload.scheme
            )));
        }
        if payload.network != self.config.network {
            return Err(X402Error::proof_rejected(format!(
                "network mismatch: expected {}, got {}",
                self.config.network, payload.network
            )));
        }

        let tx_bytes = general_purpose::STANDARD.decode(&payload.payload)?;
        let transaction: Transaction = bincode::deserialize(&tx_bytes)?;

        // Check the signatures against the message, not just their presence.
        transaction
            .verify()
            .map_err(|e| X402Error::proof_rejected(format!("bad signature: {}", e)))?;

        let verified = self.find_qualifying_transfer(&transaction)?;

        tracing::debug!(
            payer = %verified.payer,
            lamports = verified.lamports,
            "payment proof verified"
        );

        Ok(verified)
    }

    /// Find a System Program transfer to the configured recipient
    ///
    /// Other instructions in the transaction are ignored; only a transfer to
    /// a different recipient never counts, however many there are.
    fn find_qualifying_transfer(&self, transaction: &Transaction) -> Result<VerifiedPayment> {
        let message = &transaction.message;
        let mut shortfall: Option<u64> = None;

        for instruction in &message.instructions {
            let Some(program_id) = message.account_keys.get(instruction.program_id_index as usize)
            else {
                continue;
            };
            if *program_id != system_program::id() {
                continue;
            }
            let Ok(SystemInstruction::Transfer { lamports }) =
                bincode::deserialize(&instruction.data)
            else {
                continue;
            };
            let Some(recipient) = instruction
                .accounts
                .get(1)
                .and_then(|index| message.account_keys.get(*index as usize))
            else {
                continue;
            };

            if *recipient != self.config.pay_to {
                continue;
            }
            if lamports < self.config.min_transfer_lamports {
                shortfall = Some(shortfall.map_or(lamports, |s| s.max(lamports)));
                continue;
            }

            let payer = message
                .account_keys
                .first()
                .copied()
                .ok_or_else(|| X402Error::proof_rejected("transaction has no accounts"))?;

            return Ok(VerifiedPayment { payer, lamports });
        }

        if let Some(lamports) = shortfall {
            return Err(X402Error::proof_rejected(format!(
                "transfer of {} lamports is below the required {}",
                lamports, self.config.min_transfer_lamports
            )));
        }

        Err(X402Error::proof_rejected(
            "transaction carries no transfer to the configured recipient",
        ))
    }
}
