//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- verified bearer token claims (header, then cookie).
//! - [`rbac::CurrentUser`] -- the canonical user record, freshly read.
//! - [`rbac::RequireAdmin`] -- requires the stored role to be `admin`.
//! - [`rbac::RequirePremium`] -- requires the stored premium entitlement.

pub mod auth;
pub mod rbac;
