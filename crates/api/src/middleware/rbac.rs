//! Authorization extractors backed by the canonical user record.
//!
//! Token claims are a hint. Every extractor here re-reads the user from the
//! store so a stale token can never widen access.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use marketgate_core::entitlement::is_premium_eligible;
use marketgate_core::error::CoreError;
use marketgate_core::roles::UserRole;
use marketgate_db::models::user::User;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated user's current stored record.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user = state
            .store
            .find_user_by_id(auth.user_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("User no longer exists".into()))
            })?;
        Ok(CurrentUser(user))
    }
}

/// Requires the stored role to be `admin`. Rejects with 403 Forbidden otherwise.
///
/// No route in this service is admin-only; the extractor is exported for
/// features layered on top of it.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires an active premium entitlement. Rejects with 403 Forbidden otherwise.
///
/// Exported for premium-gated features outside this service. Here the gate
/// is only read through `GET /entitlements/premium`.
pub struct RequirePremium(pub User);

impl FromRequestParts<AppState> for RequirePremium {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !is_premium_eligible(&user) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Premium membership required".into(),
            )));
        }
        Ok(RequirePremium(user))
    }
}
