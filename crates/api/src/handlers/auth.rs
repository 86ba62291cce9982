//! Handlers for the `/auth` resource (register, login, role, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use marketgate_core::error::CoreError;
use marketgate_core::identity::{canonical_email, normalize_email, IdentityProvider};
use marketgate_core::roles::UserRole;
use marketgate_db::models::user::{CreateUser, User, UserResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_body;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::services::identity::issue_token_for;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 254))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/role`.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// Returned by every operation that mints a token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create a password account. Returns 201 with a token.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    // 1. Validate input.
    validate_body(&input)?;
    let email = canonical_email(&input.email)?;
    validate_password(&input.password)?;

    // 2. Hash and insert; a taken email surfaces as 409.
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = state
        .store
        .create_user(&CreateUser {
            email,
            name: input.name.filter(|n| !n.trim().is_empty()),
            avatar_url: None,
            password_hash: Some(password_hash),
            identity_provider: IdentityProvider::None,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    // 3. Issue the token.
    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    // 1. Find user by email, normalized the same way registration stores it.
    let user = state
        .store
        .find_user_by_email(&normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;

    // 2. Verify password. Provider-only accounts have none and never match.
    let valid = verify_password(&input.password, user.password_hash.as_deref())
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "User logged in");

    // 3. Issue the token.
    Ok(Json(auth_response(&state, &user)?))
}

/// POST /api/v1/auth/role
///
/// One-time onboarding choice of `buyer` or `seller`. Returns a fresh token
/// carrying the new role.
pub async fn set_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RoleRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Only onboarding roles may be chosen.
    let role = UserRole::parse(&input.role)?;
    if !role.is_onboarding_choice() {
        return Err(AppError::Core(CoreError::Validation(
            "Role must be 'buyer' or 'seller'".into(),
        )));
    }

    // 2. The stored role, not the token's, decides whether a choice is still open.
    if user.role != UserRole::Unset {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Role is already set to '{}'",
            user.role
        ))));
    }

    // 3. Guarded update; losing a race to a concurrent request is a conflict too.
    let updated = state
        .store
        .set_role_if_unset(user.id, role)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Conflict("Role is already set".into())))?;

    tracing::info!(user_id = %updated.id, role = %updated.role, "Onboarding role chosen");

    // 4. The old token still carries `unset`; hand out one with the new role.
    Ok(Json(auth_response(&state, &updated)?))
}

/// GET /api/v1/auth/me
///
/// The caller's current stored record.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: UserResponse::from(&user),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        token: issue_token_for(user, &state.config.jwt)?,
        user: UserResponse::from(user),
    })
}
