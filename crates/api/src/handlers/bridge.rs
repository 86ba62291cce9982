//! Handler for `POST /auth/bridge`: exchange a provider assertion for a
//! bearer token.

use axum::extract::State;
use axum::Json;
use marketgate_core::error::CoreError;
use marketgate_core::identity::IdentityProvider;
use serde::Deserialize;

use super::auth::{auth_response, AuthResponse};
use crate::auth::assertion::verify_assertion;
use crate::error::{AppError, AppResult};
use crate::services::identity::{resolve_or_create, VerifiedIdentity};
use crate::state::AppState;

/// Request body for `POST /auth/bridge`.
#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    /// `google` or `clerk`.
    pub provider: String,
    /// HS256 JWT signed with that provider's assertion secret.
    pub assertion: String,
}

/// POST /api/v1/auth/bridge
pub async fn bridge(
    State(state): State<AppState>,
    Json(input): Json<BridgeRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Only external providers with a configured secret are accepted.
    let provider = IdentityProvider::parse(&input.provider)?;
    if !provider.is_external() {
        return Err(AppError::Core(CoreError::Validation(
            "Provider must be 'google' or 'clerk'".into(),
        )));
    }
    let secret = state.config.providers.secret_for(provider).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Identity provider '{provider}' is not enabled"
        )))
    })?;

    // 2. Verify the assertion.
    let assertion = verify_assertion(&input.assertion, secret)?;

    // 3. Resolve the local user and issue our own token.
    let user = resolve_or_create(
        state.store.as_ref(),
        &VerifiedIdentity {
            provider,
            email: assertion.email,
            name: assertion.name,
            avatar_url: assertion.picture,
        },
    )
    .await?;

    tracing::debug!(user_id = %user.id, %provider, subject = %assertion.sub, "Provider session bridged");

    Ok(Json(auth_response(&state, &user)?))
}
