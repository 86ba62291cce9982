use axum::routing::get;
use axum::Router;

use crate::handlers::entitlements;
use crate::state::AppState;

/// Routes mounted at `/entitlements`.
pub fn router() -> Router<AppState> {
    Router::new().route("/premium", get(entitlements::premium))
}
