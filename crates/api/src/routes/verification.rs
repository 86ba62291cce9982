//! Route definitions for the `/verification/phone` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::verification;
use crate::state::AppState;

/// Routes mounted at `/verification/phone`. Both require auth.
///
/// ```text
/// POST /request -> request
/// POST /verify  -> verify
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(verification::request))
        .route("/verify", post(verification::verify))
}
