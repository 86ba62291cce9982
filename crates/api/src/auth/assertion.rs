//! Identity assertions handed over by the provider-facing session layer.
//!
//! Once Google or Clerk has confirmed a user, the session layer signs a short
//! HS256 JWT with a secret shared with this service (one per provider). The
//! bridge trusts the email in a valid assertion without further proof.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use marketgate_core::identity::IdentityProvider;
use serde::{Deserialize, Serialize};

use super::jwt::TokenError;

/// Claims of a provider assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAssertion {
    /// Provider-side subject identifier.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: i64,
}

/// Per-provider assertion secrets. A provider without a secret is disabled.
#[derive(Debug, Clone, Default)]
pub struct ProviderSecrets {
    pub google: Option<String>,
    pub clerk: Option<String>,
}

impl ProviderSecrets {
    /// | Env Var                   | Default  |
    /// |---------------------------|----------|
    /// | `GOOGLE_ASSERTION_SECRET` | disabled |
    /// | `CLERK_ASSERTION_SECRET`  | disabled |
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|s| !s.is_empty());
        Self {
            google: read("GOOGLE_ASSERTION_SECRET"),
            clerk: read("CLERK_ASSERTION_SECRET"),
        }
    }

    pub fn secret_for(&self, provider: IdentityProvider) -> Option<&str> {
        match provider {
            IdentityProvider::Google => self.google.as_deref(),
            IdentityProvider::Clerk => self.clerk.as_deref(),
            IdentityProvider::None => None,
        }
    }
}

/// Verify an assertion's signature and expiry.
pub fn verify_assertion(token: &str, secret: &str) -> Result<ProviderAssertion, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<ProviderAssertion>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
