//! Route definitions for the `/payments` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Full path of the gateway notification endpoint.
pub const CALLBACK_PATH: &str = "/api/v1/payments/callback";

/// Routes mounted at `/payments`.
///
/// ```text
/// GET  /plans          -> list_plans
/// POST /initiate       -> initiate_payment (requires auth)
/// GET  /{merchant_oid} -> get_purchase (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(payments::list_plans))
        .route("/initiate", post(payments::initiate_payment))
        .route("/{merchant_oid}", get(payments::get_purchase))
}

/// The gateway callback (signature-gated, no bearer token).
///
/// Mounted at [`CALLBACK_PATH`] outside the request timeout and panic layers:
/// the handler bounds its own work and must always answer `OK`.
pub fn callback_router() -> Router<AppState> {
    Router::new().route(CALLBACK_PATH, post(payments::callback))
}
