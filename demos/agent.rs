//! Agent-side payment flow
//!
//! Fetches the metered data feed, paying via the x402 exchange when
//! challenged. Configure with:
//!   AGENT_ADDRESS   the agent's managed wallet address (required)
//!   SIGNER_URL      base URL of the custodial signing service (required)
//!   SIGNER_TOKEN    bearer token for the signing service (optional)
//!   SOLANA_RPC_URL  RPC endpoint, default mainnet-beta
//!   TARGET_URL      resource to fetch, default the local demo server

use std::{env, sync::Arc};
use x402_solana::rpc::DEFAULT_RPC_URL;
use x402_solana::{ProofBuilder, SolanaRpcClient, WalletSignerClient, X402Client};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let agent = env::var("AGENT_ADDRESS")
        .map_err(|_| "AGENT_ADDRESS must be set")?
        .trim()
        .parse()?;
    let rpc_url = env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
    let signer_url = env::var("SIGNER_URL").map_err(|_| "SIGNER_URL must be set")?;
    let target_url = env::var("TARGET_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/api/data-feed".to_string());

    let rpc = Arc::new(SolanaRpcClient::new(rpc_url)?);
    let mut signer = WalletSignerClient::new(signer_url)?;
    if let Ok(token) = env::var("SIGNER_TOKEN") {
        signer = signer.with_auth_token(token);
    }

    let builder = ProofBuilder::new(agent, rpc, Arc::new(signer));
    let client = X402Client::new();

    match client.fetch_with_payment(&target_url, &builder).await {
        Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
        Err(err) => {
            eprintln!("payment flow failed ({}): {}", err.status_code(), err);
            std::process::exit(1);
        }
    }

    Ok(())
}
