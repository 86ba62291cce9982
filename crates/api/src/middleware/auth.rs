//! Bearer credential extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use marketgate_core::error::CoreError;
use marketgate_core::roles::UserRole;
use marketgate_core::types::DbId;

use crate::auth::jwt::{verify_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Cookie that may carry the bearer token when no `Authorization` header is sent.
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated principal taken from a verified bearer token.
///
/// `role` is the role at issue time. Use it for display and routing only;
/// privileged decisions go through the extractors in [`super::rbac`].
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub email: String,
    pub role: UserRole,
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = verify_token(&token, &state.config.jwt)?;

        Ok(AuthUser {
            user_id: claims.id,
            email: claims.email.clone(),
            role: claims.user_type,
            claims,
        })
    }
}

/// Find the presented token: `Authorization: Bearer` first, then the cookie.
fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(header) = headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| unauthenticated("Unreadable Authorization header"))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            unauthenticated("Invalid Authorization format. Expected: Bearer <token>")
        })?;
        return Ok(token.trim().to_string());
    }

    cookie_value(headers, TOKEN_COOKIE)
        .ok_or_else(|| unauthenticated("Missing bearer token"))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn unauthenticated(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.into()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("token=from-cookie"));
        assert_eq!(bearer_token(&headers).unwrap(), "from-header");
    }

    #[test]
    fn cookie_is_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn non_bearer_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_matches!(
            bearer_token(&headers),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }

    #[test]
    fn nothing_presented_is_unauthenticated() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("tokenish=1; token="));
        assert_matches!(
            bearer_token(&headers),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }
}
