//! Identity bridge: turn a provider-confirmed identity into a local user and
//! a bearer token.
//!
//! Accounts are linked by email alone. Whoever controls a provider account
//! with a given email controls the local account with that email.

use marketgate_core::error::CoreError;
use marketgate_core::identity::{canonical_email, IdentityProvider};
use marketgate_db::models::user::{CreateUser, LinkIdentity, User};
use marketgate_db::{Store, StoreError};

use crate::auth::jwt::{issue_token, JwtConfig};
use crate::error::{AppError, AppResult};

/// Identity facts asserted by a provider.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub provider: IdentityProvider,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Find the user with this email or create one.
///
/// An existing user gets the provider name and avatar refreshed and a missing
/// name filled in; role, premium and phone fields are never touched.
pub async fn resolve_or_create(store: &dyn Store, identity: &VerifiedIdentity) -> AppResult<User> {
    let email = canonical_email(&identity.email)?;
    let link = LinkIdentity {
        identity_provider: identity.provider,
        name: identity.name.clone(),
        avatar_url: identity.avatar_url.clone(),
    };

    if let Some(existing) = store.find_user_by_email(&email).await? {
        return link_existing(store, &existing, &link).await;
    }

    let input = CreateUser {
        email: email.clone(),
        name: identity.name.clone(),
        avatar_url: identity.avatar_url.clone(),
        password_hash: None,
        identity_provider: identity.provider,
    };

    match store.create_user(&input).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, provider = %identity.provider, "User created from provider sign-in");
            Ok(user)
        }
        // A concurrent sign-in created the row first; attach to it.
        Err(StoreError::Duplicate(_)) => {
            let existing = store.find_user_by_email(&email).await?.ok_or_else(|| {
                AppError::InternalError(format!("User {email} vanished after duplicate insert"))
            })?;
            link_existing(store, &existing, &link).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn link_existing(store: &dyn Store, existing: &User, link: &LinkIdentity) -> AppResult<User> {
    let user = store
        .link_identity(existing.id, link)
        .await?
        .ok_or_else(|| CoreError::not_found("user", existing.id))?;
    tracing::info!(user_id = %user.id, provider = %link.identity_provider, "Provider identity linked");
    Ok(user)
}

/// Mint the standard bearer token for `user`.
pub fn issue_token_for(user: &User, config: &JwtConfig) -> AppResult<String> {
    issue_token(user.into(), config)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}
