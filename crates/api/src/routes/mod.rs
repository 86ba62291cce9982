pub mod auth;
pub mod entitlements;
pub mod health;
pub mod payments;
pub mod verification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                      register with password (public)
/// /auth/login                         password login (public)
/// /auth/bridge                        provider assertion -> token (public)
/// /auth/role                          one-time onboarding role choice
/// /auth/me                            current stored user
///
/// /verification/phone/request         send a one-time code
/// /verification/phone/verify          submit a one-time code
///
/// /payments/plans                     plan catalog (public)
/// /payments/initiate                  open a hosted payment session
/// /payments/callback                  gateway notification (mounted by `app`)
/// /payments/{merchant_oid}            purchase status (owner only)
///
/// /entitlements/premium               premium status (fresh read)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/verification/phone", verification::router())
        .nest("/payments", payments::router())
        .nest("/entitlements", entitlements::router())
}
