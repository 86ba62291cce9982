//! Domain logic for identity, phone verification, and premium entitlement.
//!
//! This crate performs no I/O. Persistence lives in `marketgate-db`, external
//! gateways in `marketgate-gateways`, and HTTP wiring in `marketgate-api`.

pub mod entitlement;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod otp;
pub mod payment;
pub mod phone;
pub mod plans;
pub mod roles;
pub mod types;
