//! End-to-end tests for the x402 exchange
//!
//! Each test serves the guarded router on an ephemeral port and drives the
//! client orchestrator against it, with the RPC and signing services stubbed
//! in-process.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use x402_solana::axum::protect;
use x402_solana::rpc::BlockhashProvider;
use x402_solana::signer::TransactionSigner;
use x402_solana::{
    GuardConfig, PaymentGuard, PaymentPayload, PaymentRequirementsResponse, ProofBuilder, Result,
    X402Client, X402Error, X_PAYMENT_HEADER,
};

struct FixedBlockhash(Hash);

#[async_trait]
impl BlockhashProvider for FixedBlockhash {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.0)
    }
}

struct FailingBlockhash;

#[async_trait]
impl BlockhashProvider for FailingBlockhash {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Err(X402Error::upstream_unavailable("RPC request failed"))
    }
}

/// Stands in for the custodial wallet service: signs whatever transaction
/// it receives with a locally held keypair.
struct LocalSigner {
    keypair: Keypair,
    calls: AtomicUsize,
}

impl LocalSigner {
    fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TransactionSigner for LocalSigner {
    async fn sign_transaction(&self, _address: &str, transaction: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = general_purpose::STANDARD.decode(transaction)?;
        let mut tx: Transaction = bincode::deserialize(&bytes)?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[&self.keypair], blockhash)
            .map_err(|e| X402Error::signing_failed(e.to_string()))?;
        Ok(general_purpose::STANDARD.encode(bincode::serialize(&tx)?))
    }
}

/// A signer that swaps the payment for one addressed to a different
/// recipient, so the guard rejects the retry.
struct MisdirectedSigner {
    keypair: Keypair,
    other_recipient: Pubkey,
}

#[async_trait]
impl TransactionSigner for MisdirectedSigner {
    async fn sign_transaction(&self, _address: &str, transaction: &str) -> Result<String> {
        let bytes = general_purpose::STANDARD.decode(transaction)?;
        let tx: Transaction = bincode::deserialize(&bytes)?;
        let blockhash = tx.message.recent_blockhash;

        let instruction = system_instruction::transfer(
            &self.keypair.pubkey(),
            &self.other_recipient,
            1,
        );
        let message = Message::new_with_blockhash(
            &[instruction],
            Some(&self.keypair.pubkey()),
            &blockhash,
        );
        let mut swapped = Transaction::new_unsigned(message);
        swapped
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| X402Error::signing_failed(e.to_string()))?;
        Ok(general_purpose::STANDARD.encode(bincode::serialize(&swapped)?))
    }
}

struct TestServer {
    addr: SocketAddr,
    handler_calls: Arc<AtomicUsize>,
}

impl TestServer {
    fn url(&self) -> String {
        format!("http://{}/api/data-feed", self.addr)
    }
}

/// Serve the guarded data-feed route on an ephemeral port.
async fn spawn_guarded_server(guard: PaymentGuard) -> TestServer {
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let calls = handler_calls.clone();

    let app = protect(
        Router::new().route(
            "/api/data-feed",
            get(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "data": "SUCCESS: autonomous agent data feed unlocked on Solana mainnet.",
                        "fee": "Paid $0.01 in USDC (Solana mainnet)",
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                    }))
                }
            }),
        ),
        Arc::new(guard),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        addr,
        handler_calls,
    }
}

fn merchant_guard(pay_to: Pubkey) -> PaymentGuard {
    PaymentGuard::new(GuardConfig::new(pay_to, "0.01".parse().unwrap()))
}

#[tokio::test]
async fn test_bare_request_receives_challenge() {
    let merchant = Keypair::new().pubkey();
    let server = spawn_guarded_server(merchant_guard(merchant)).await;

    let response = reqwest::get(server.url()).await.unwrap();
    assert_eq!(response.status(), 402);

    let challenge: PaymentRequirementsResponse = response.json().await.unwrap();
    assert_eq!(challenge.accepts.len(), 1);

    let requirements = &challenge.accepts[0];
    assert_eq!(requirements.scheme, "exact");
    assert_eq!(requirements.network, "solana");
    assert_eq!(requirements.pay_to, merchant.to_string());
    assert_eq!(requirements.asset, "USDC");
    assert_eq!(requirements.amount, "0.01");

    assert_eq!(server.handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_full_payment_flow_unlocks_resource() {
    let agent_keypair = Keypair::new();
    let agent = agent_keypair.pubkey();
    let merchant = Keypair::new().pubkey();
    let server = spawn_guarded_server(merchant_guard(merchant)).await;

    let signer = Arc::new(LocalSigner::new(agent_keypair));
    let builder = ProofBuilder::new(
        agent,
        Arc::new(FixedBlockhash(Hash::new_unique())),
        signer.clone(),
    );
    let client = X402Client::new();

    let body = client
        .fetch_with_payment(&server.url(), &builder)
        .await
        .unwrap();

    assert!(body["data"].as_str().unwrap().starts_with("SUCCESS"));
    assert!(body["fee"].as_str().unwrap().contains("USDC"));
    assert!(body["timestamp"].is_string());

    // Exactly one signing round trip and exactly one handler execution.
    assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.handler_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_proof_returns_second_response_as_is() {
    let agent_keypair = Keypair::new();
    let agent = agent_keypair.pubkey();
    let merchant = Keypair::new().pubkey();
    let server = spawn_guarded_server(merchant_guard(merchant)).await;

    let signer = Arc::new(MisdirectedSigner {
        keypair: agent_keypair,
        other_recipient: Keypair::new().pubkey(),
    });
    let builder = ProofBuilder::new(agent, Arc::new(FixedBlockhash(Hash::new_unique())), signer);
    let client = X402Client::new();

    // The retry comes back 402; the orchestrator returns that body rather
    // than erroring, and the protected handler never runs.
    let body = client
        .fetch_with_payment(&server.url(), &builder)
        .await
        .unwrap();

    assert!(body["accepts"].is_array());
    assert!(body["error"].as_str().unwrap().contains("transfer"));
    assert_eq!(server.handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rpc_outage_aborts_before_retry() {
    let agent_keypair = Keypair::new();
    let agent = agent_keypair.pubkey();
    let merchant = Keypair::new().pubkey();
    let server = spawn_guarded_server(merchant_guard(merchant)).await;

    let signer = Arc::new(LocalSigner::new(agent_keypair));
    let builder = ProofBuilder::new(agent, Arc::new(FailingBlockhash), signer.clone());
    let client = X402Client::new();

    let err = client
        .fetch_with_payment(&server.url(), &builder)
        .await
        .unwrap_err();

    assert!(matches!(err, X402Error::UpstreamUnavailable { .. }));
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(server.handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_accepts_fails_before_signing() {
    // A 402 with an empty accepts list is an error condition, surfaced
    // before any signing attempt.
    let app = Router::new().route(
        "/broken",
        get(|| async {
            (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({ "accepts": [] })),
            )
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let agent_keypair = Keypair::new();
    let agent = agent_keypair.pubkey();
    let signer = Arc::new(LocalSigner::new(agent_keypair));
    let builder = ProofBuilder::new(
        agent,
        Arc::new(FixedBlockhash(Hash::new_unique())),
        signer.clone(),
    );
    let client = X402Client::new();

    let err = client
        .fetch_with_payment(&format!("http://{}/broken", addr), &builder)
        .await
        .unwrap_err();

    assert!(matches!(err, X402Error::NoPaymentOptions));
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unprotected_resource_returns_without_payment() {
    let app = Router::new().route("/free", get(|| async { Json(json!({ "data": "gratis" })) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let agent_keypair = Keypair::new();
    let agent = agent_keypair.pubkey();
    let signer = Arc::new(LocalSigner::new(agent_keypair));
    let builder = ProofBuilder::new(
        agent,
        Arc::new(FixedBlockhash(Hash::new_unique())),
        signer.clone(),
    );
    let client = X402Client::new();

    let body = client
        .fetch_with_payment(&format!("http://{}/free", addr), &builder)
        .await
        .unwrap();

    assert_eq!(body["data"], "gratis");
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_replayed_proof_is_reaccepted() {
    // The guard keeps no replay state; a captured header verifies twice.
    // Known limitation of this design.
    let agent_keypair = Keypair::new();
    let agent = agent_keypair.pubkey();
    let merchant = Keypair::new().pubkey();
    let server = spawn_guarded_server(merchant_guard(merchant)).await;

    let blockhash = Hash::new_unique();
    let instruction = system_instruction::transfer(&agent, &merchant, 1);
    let message = Message::new_with_blockhash(&[instruction], Some(&agent), &blockhash);
    let mut tx = Transaction::new_unsigned(message);
    tx.try_sign(&[&agent_keypair], blockhash).unwrap();

    let payload = PaymentPayload::new(
        "exact",
        "solana",
        general_purpose::STANDARD.encode(bincode::serialize(&tx).unwrap()),
    );
    let header = payload.to_base64().unwrap();

    let http = reqwest::Client::new();
    for _ in 0..2 {
        let response = http
            .get(server.url())
            .header(X_PAYMENT_HEADER, &header)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    assert_eq!(server.handler_calls.load(Ordering::SeqCst), 2);
}
