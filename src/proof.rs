//! Payment proof construction
//!
//! Turns a chosen [`PaymentRequirements`] descriptor into a signed
//! [`PaymentPayload`] via one RPC read and one signing-service call. The
//! signed transaction is never broadcast; it travels only inside the
//! `X-PAYMENT` header.

use crate::rpc::BlockhashProvider;
use crate::signer::TransactionSigner;
use crate::types::{PaymentPayload, PaymentRequirements};
use crate::{Result, X402Error};
use base64::{engine::general_purpose, Engine as _};
use rust_decimal::Decimal;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;

/// Nominal lamport amount for the demo transfer
///
/// A real deployment would construct an SPL-token instruction for the priced
/// asset and amount; this minimal native transfer exercises the same
/// construct/sign/retry flow.
pub const NOMINAL_TRANSFER_LAMPORTS: u64 = 1;

/// Builds signed payment proofs for a managed agent wallet
#[derive(Clone)]
pub struct ProofBuilder {
    /// The agent's own address; sender and fee payer
    agent: Pubkey,
    /// Source of recent block references
    rpc: Arc<dyn BlockhashProvider>,
    /// Remote custodian holding the agent's key material
    signer: Arc<dyn TransactionSigner>,
}

impl std::fmt::Debug for ProofBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofBuilder")
            .field("agent", &self.agent)
            .finish()
    }
}

impl ProofBuilder {
    /// Create a new proof builder
    pub fn new(
        agent: Pubkey,
        rpc: Arc<dyn BlockhashProvider>,
        signer: Arc<dyn TransactionSigner>,
    ) -> Self {
        Self { agent, rpc, signer }
    }

    /// The agent address this builder signs for
    pub fn agent(&self) -> &Pubkey {
        &self.agent
    }

    /// Build a signed payment proof for the given requirements
    ///
    /// Validates the descriptor's recipient and amount, fetches a recent
    /// blockhash, constructs a minimal native transfer to the recipient with
    /// the agent as fee payer, serializes it unsigned, and submits it to the
    /// signing service.
    pub async fn build(&self, requirements: &PaymentRequirements) -> Result<PaymentPayload> {
        if requirements.pay_to.is_empty() {
            return Err(X402Error::malformed_requirement(
                "descriptor has no payTo address",
            ));
        }

        let pay_to: Pubkey = requirements.pay_to.parse().map_err(|_| {
            X402Error::malformed_requirement(format!(
                "payTo is not a valid address: {}",
                requirements.pay_to
            ))
        })?;

        let amount = requirements.amount_as_decimal()?;
        if amount <= Decimal::ZERO {
            return Err(X402Error::malformed_requirement(format!(
                "amount must be positive, got {}",
                requirements.amount
            )));
        }

        let blockhash = self.rpc.latest_blockhash().await?;

        let instruction =
            system_instruction::transfer(&self.agent, &pay_to, NOMINAL_TRANSFER_LAMPORTS);
        let message = Message::new_with_blockhash(&[instruction], Some(&self.agent), &blockhash);
        let transaction = Transaction::new_unsigned(message);

        // Serialized without signatures; the wallet service fills them in.
        let serialized = bincode::serialize(&transaction)?;
        let unsigned_b64 = general_purpose::STANDARD.encode(serialized);

        let signed_b64 = self
            .signer
            .sign_transaction(&self.agent.to_string(), &unsigned_b64)
            .await?;

        tracing::info!(
            agent = %self.agent,
            pay_to = %pay_to,
            scheme = %requirements.scheme,
            network = %requirements.network,
            "payment proof built"
        );

        Ok(PaymentPayload::new(
            &requirements.scheme,
            &requirements.network,
            signed_b64,
        ))
    }
}
