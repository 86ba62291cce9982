//! One-time codes for phone possession challenges.
//!
//! A challenge per (user, phone) pair moves through:
//!
//! ```text
//! [none] --request--> [pending, expires = now + 5m]
//! [pending] --correct code, before expiry--> [verified]   (terminal)
//! [pending] --wrong code, before expiry-->   [pending]    (unchanged)
//! [pending] --any code, after expiry-->      [expired]    (terminal, purged)
//! [pending] --new request for same pair-->   superseded by a fresh [pending]
//! ```
//!
//! Submission attempts are not rate-limited.

use chrono::Duration;
use rand::Rng;

use crate::error::CoreError;
use crate::hashing::constant_time_eq;
use crate::types::Timestamp;

/// Number of decimal digits in a code.
pub const CODE_LENGTH: usize = 6;

/// Lifetime of a challenge in minutes.
pub const CHALLENGE_TTL_MINS: i64 = 5;

/// Smallest and largest codes; together they span exactly the 6-digit numbers.
const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Draw a uniformly random 6-digit code from `100000..=999999`.
pub fn generate_code() -> String {
    rand::rng().random_range(CODE_MIN..=CODE_MAX).to_string()
}

/// Expiry timestamp for a challenge issued at `now`.
pub fn challenge_expiry(now: Timestamp) -> Timestamp {
    now + Duration::minutes(CHALLENGE_TTL_MINS)
}

/// Text delivered to the phone.
pub fn message_body(code: &str) -> String {
    format!("Your verification code is {code}. It expires in {CHALLENGE_TTL_MINS} minutes.")
}

/// Check a submitted code against a pending challenge.
///
/// Expiry is checked before the code so a late submission fails with
/// [`CoreError::Expired`] whether or not the code is right.
pub fn check_submission(
    expected: &str,
    expires_at: Timestamp,
    submitted: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    if now > expires_at {
        return Err(CoreError::Expired(
            "Verification code has expired; request a new one".into(),
        ));
    }
    if !constant_time_eq(expected.as_bytes(), submitted.trim().as_bytes()) {
        return Err(CoreError::CodeMismatch);
    }
    Ok(())
}
