//! Credential primitives.
//!
//! - [`jwt`] -- bearer token issuance and verification.
//! - [`password`] -- Argon2id hashing and the password policy.
//! - [`assertion`] -- verification of identity-provider assertions.

pub mod assertion;
pub mod jwt;
pub mod password;
