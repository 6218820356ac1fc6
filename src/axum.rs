//! Axum integration for the payment guard

use crate::guard::PaymentGuard;
use crate::types::X_PAYMENT_HEADER;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use std::sync::Arc;

/// Axum middleware function enforcing payment before the inner handler runs
///
/// A request without an `X-PAYMENT` header gets a 402 carrying the guard's
/// payment requirements and the handler is not invoked. A request with a
/// header that fails verification gets a 402 again, never a 200 or 500. Only
/// a verified proof lets the handler execute.
pub async fn payment_middleware(
    State(guard): State<Arc<PaymentGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(X_PAYMENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match header {
        None => {
            tracing::debug!(uri = %request.uri(), "no payment header, issuing 402 challenge");
            (
                StatusCode::PAYMENT_REQUIRED,
                Json(guard.challenge("X-PAYMENT header is required")),
            )
                .into_response()
        }
        Some(header) => match guard.verify(&header) {
            Ok(verified) => {
                tracing::info!(
                    uri = %request.uri(),
                    payer = %verified.payer,
                    lamports = verified.lamports,
                    "payment accepted"
                );
                next.run(request).await
            }
            Err(err) => {
                tracing::warn!(uri = %request.uri(), error = %err, "payment rejected");
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(guard.challenge(err.to_string())),
                )
                    .into_response()
            }
        },
    }
}

/// Wrap a router so every route in it requires payment
pub fn protect(router: Router, guard: Arc<PaymentGuard>) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        guard,
        payment_middleware,
    ))
}
