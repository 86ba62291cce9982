//! Premium entitlement gate.
//!
//! Callers must pass the canonical user record, freshly read from storage,
//! never a role or flag copied out of a bearer token. Composition with other
//! rules (resource ownership, admin override) belongs to the calling feature.

/// Anything that carries the reconciled premium flag.
pub trait Entitled {
    fn is_premium(&self) -> bool;
}

/// Is this principal allowed to use a premium-gated capability?
pub fn is_premium_eligible<U: Entitled + ?Sized>(user: &U) -> bool {
    user.is_premium()
}
