//! Phone verification challenge model.

use marketgate_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One outstanding (or consumed) proof-of-possession attempt.
///
/// The code is never serialized; it only leaves the system through the
/// messaging gateway.
#[derive(Debug, Clone, FromRow)]
pub struct PhoneChallenge {
    pub id: DbId,
    pub user_id: DbId,
    /// Normalized `+<digits>` form.
    pub phone_number: String,
    pub code: String,
    pub expires_at: Timestamp,
    pub verified: bool,
    pub created_at: Timestamp,
}

/// DTO for issuing a new challenge.
#[derive(Debug, Clone)]
pub struct CreateChallenge {
    pub user_id: DbId,
    pub phone_number: String,
    pub code: String,
    pub expires_at: Timestamp,
}
