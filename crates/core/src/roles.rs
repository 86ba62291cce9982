//! User roles.
//!
//! The string forms must match the `CHECK` constraint on `users.role`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_UNSET: &str = "unset";
pub const ROLE_BUYER: &str = "buyer";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_ADMIN: &str = "admin";

/// Authorization role of a user.
///
/// A fresh account starts as [`UserRole::Unset`] and moves to buyer or
/// seller exactly once during onboarding. Admins are provisioned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Unset,
    Buyer,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => ROLE_UNSET,
            Self::Buyer => ROLE_BUYER,
            Self::Seller => ROLE_SELLER,
            Self::Admin => ROLE_ADMIN,
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            ROLE_UNSET => Ok(Self::Unset),
            ROLE_BUYER => Ok(Self::Buyer),
            ROLE_SELLER => Ok(Self::Seller),
            ROLE_ADMIN => Ok(Self::Admin),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }

    /// Roles a user may pick for themselves during onboarding.
    pub fn is_onboarding_choice(self) -> bool {
        matches!(self, Self::Buyer | Self::Seller)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for UserRole {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
