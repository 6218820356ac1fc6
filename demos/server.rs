//! Metered data-feed server
//!
//! Exposes `GET /api/data-feed` behind the payment guard. Configure with:
//!   PAY_TO_ADDRESS  merchant wallet address (required)
//!   PRICE_USDC      advertised price, default "0.01"
//!   BIND_ADDR       listen address, default "127.0.0.1:8000"

use axum::{routing::get, Json, Router};
use serde_json::json;
use std::{env, sync::Arc};
use tower_http::trace::TraceLayer;
use x402_solana::axum::protect;
use x402_solana::{GuardConfig, PaymentGuard};

async fn data_feed() -> Json<serde_json::Value> {
    Json(json!({
        "data": "SUCCESS: autonomous agent data feed unlocked on Solana mainnet.",
        "fee": "Paid $0.01 in USDC (Solana mainnet)",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let pay_to = env::var("PAY_TO_ADDRESS")
        .map_err(|_| "PAY_TO_ADDRESS must be set")?
        .trim()
        .parse()?;
    let amount = env::var("PRICE_USDC")
        .unwrap_or_else(|_| "0.01".to_string())
        .parse()?;
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

    let guard = Arc::new(PaymentGuard::new(GuardConfig::new(pay_to, amount)));
    tracing::info!(pay_to = %guard.config().pay_to, amount = %guard.config().amount, "guard configured");

    let app = protect(
        Router::new().route("/api/data-feed", get(data_feed)),
        guard,
    )
    .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "serving metered data feed");
    axum::serve(listener, app).await?;

    Ok(())
}
