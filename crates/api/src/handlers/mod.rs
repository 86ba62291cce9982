pub mod auth;
pub mod bridge;
pub mod entitlements;
pub mod payments;
pub mod verification;

use validator::Validate;

use crate::error::{AppError, AppResult};

/// Run derived `validator` rules on a request body.
pub(crate) fn validate_body<T: Validate>(input: &T) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
