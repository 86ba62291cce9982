//! User entity model and DTOs.

use marketgate_core::entitlement::Entitled;
use marketgate_core::identity::IdentityProvider;
use marketgate_core::roles::UserRole;
use marketgate_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    /// Canonical (trimmed, lowercased) address; unique across identity origins.
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    /// `None` for accounts that only ever signed in through a provider.
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub is_phone_verified: bool,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub is_premium: bool,
    #[sqlx(try_from = "String")]
    pub identity_provider: IdentityProvider,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entitled for User {
    fn is_premium(&self) -> bool {
        self.is_premium
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub is_phone_verified: bool,
    pub role: UserRole,
    pub is_premium: bool,
    pub identity_provider: IdentityProvider,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            phone_number: user.phone_number.clone(),
            is_phone_verified: user.is_phone_verified,
            role: user.role,
            is_premium: user.is_premium,
            identity_provider: user.identity_provider,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. New users always start with role `unset`.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
    pub identity_provider: IdentityProvider,
}

/// Provider details refreshed on every third-party sign-in.
///
/// Role, premium and phone fields are absent: linking never
/// touches them.
#[derive(Debug, Clone)]
pub struct LinkIdentity {
    pub identity_provider: IdentityProvider,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}
