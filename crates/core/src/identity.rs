//! Identity origins and email canonicalization.
//!
//! Accounts are linked across origins by email alone: a password signup and
//! a later third-party sign-in with the same address bind to one user. No
//! proof that the provider owns the address is requested beyond the
//! provider's own assertion.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;

pub const PROVIDER_NONE: &str = "none";
pub const PROVIDER_GOOGLE: &str = "google";
pub const PROVIDER_CLERK: &str = "clerk";

/// Where the most recent successful sign-in for a user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    /// Password signup, never linked to a third party.
    None,
    Google,
    Clerk,
}

impl IdentityProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => PROVIDER_NONE,
            Self::Google => PROVIDER_GOOGLE,
            Self::Clerk => PROVIDER_CLERK,
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            PROVIDER_NONE => Ok(Self::None),
            PROVIDER_GOOGLE => Ok(Self::Google),
            PROVIDER_CLERK => Ok(Self::Clerk),
            other => Err(CoreError::Validation(format!(
                "Unknown identity provider '{other}'"
            ))),
        }
    }

    /// Whether this value names a third-party provider that can assert identities.
    pub fn is_external(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for IdentityProvider {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Canonical form used for uniqueness checks: trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize and validate an email address in one step.
pub fn canonical_email(raw: &str) -> Result<String, CoreError> {
    let email = normalize_email(raw);
    if !email.validate_email() {
        return Err(CoreError::Validation(format!("Invalid email '{email}'")));
    }
    Ok(email)
}
