//! Bearer credential issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying a [`Claims`] payload. Nothing is
//! stored server-side: a token is valid until `exp`, and the only way to
//! change its claims is to issue a new one.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use marketgate_core::roles::UserRole;
use marketgate_core::types::DbId;
use marketgate_db::models::user::User;
use serde::{Deserialize, Serialize};

/// Secret used when `JWT_SECRET` is absent. Development only.
pub const DEV_FALLBACK_SECRET: &str = "marketgate-development-secret-do-not-deploy";

/// Default token lifetime in days.
const DEFAULT_EXPIRY_DAYS: i64 = 30;

/// Claims embedded in every bearer token.
///
/// `user_type` is a snapshot taken at issue time. Authorization decisions
/// that depend on role or entitlement must re-read the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub user_type: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in days (default: 30).
    pub expiry_days: i64,
    /// `true` when [`DEV_FALLBACK_SECRET`] is in use.
    pub using_fallback: bool,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var           | Required        | Default                 |
    /// |-------------------|-----------------|-------------------------|
    /// | `JWT_SECRET`      | in production   | [`DEV_FALLBACK_SECRET`] |
    /// | `JWT_EXPIRY_DAYS` | no              | `30`                    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_EXPIRY_DAYS` is not a valid i64.
    pub fn from_env(production: bool) -> Self {
        let secret = std::env::var("JWT_SECRET").ok();
        let expiry_days: i64 = std::env::var("JWT_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_EXPIRY_DAYS must be a valid i64");
        Self::resolve(secret, expiry_days, production)
    }

    /// Pick the signing secret, falling back to [`DEV_FALLBACK_SECRET`] with a
    /// loud log line when none is configured.
    pub fn resolve(secret: Option<String>, expiry_days: i64, production: bool) -> Self {
        match secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => Self {
                secret,
                expiry_days,
                using_fallback: false,
            },
            None => {
                if production {
                    tracing::error!(
                        "JWT_SECRET is not set in production; tokens are signed with the public development secret"
                    );
                } else {
                    tracing::warn!("JWT_SECRET is not set; using the development fallback secret");
                }
                Self {
                    secret: DEV_FALLBACK_SECRET.to_string(),
                    expiry_days,
                    using_fallback: true,
                }
            }
        }
    }
}

/// Public attributes a token is minted from.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub id: DbId,
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub role: UserRole,
}

impl<'a> From<&'a User> for TokenSubject<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id,
            email: &user.email,
            name: user.name.as_deref(),
            role: user.role,
        }
    }
}

/// Mint a signed token for `subject`, valid for the configured lifetime.
pub fn issue_token(
    subject: TokenSubject<'_>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        id: subject.id,
        email: subject.email.to_string(),
        name: subject.name.map(str::to_string),
        user_type: subject.role,
        iat: now.timestamp(),
        exp: (now + Duration::days(config.expiry_days)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the embedded [`Claims`].
///
/// No leeway is applied to `exp`.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
