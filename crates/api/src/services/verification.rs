//! Phone possession challenges.

use chrono::Utc;
use marketgate_core::error::CoreError;
use marketgate_core::otp::{challenge_expiry, check_submission, generate_code, message_body};
use marketgate_core::phone::normalize_phone;
use marketgate_core::types::{DbId, Timestamp};
use marketgate_db::models::challenge::CreateChallenge;
use marketgate_db::models::user::User;
use serde::Serialize;

use super::call_upstream;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// What the caller learns about a freshly issued challenge. The code itself
/// only travels over SMS.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeIssued {
    pub phone_number: String,
    pub expires_at: Timestamp,
}

/// Issue a new code for (`user_id`, phone) and text it.
///
/// Earlier unverified codes for the pair stop working. If delivery fails the
/// new challenge is removed again, so a retry starts clean.
pub async fn request_challenge(
    state: &AppState,
    user_id: DbId,
    raw_phone: &str,
) -> AppResult<ChallengeIssued> {
    let phone_number = normalize_phone(raw_phone, &state.config.default_country_code)?;
    let now = Utc::now();

    let challenge = state
        .store
        .replace_challenge(
            &CreateChallenge {
                user_id,
                phone_number: phone_number.clone(),
                code: generate_code(),
                expires_at: challenge_expiry(now),
            },
            now,
        )
        .await?;

    let delivery = call_upstream(
        "sms",
        state.config.upstream_timeout(),
        state.sms.send(&phone_number, &message_body(&challenge.code)),
    )
    .await;

    if let Err(e) = delivery {
        tracing::warn!(%user_id, error = %e, "Verification code delivery failed");
        if let Err(cleanup) = state.store.delete_challenge(challenge.id).await {
            tracing::error!(challenge_id = %challenge.id, error = %cleanup, "Failed to discard undelivered challenge");
        }
        return Err(AppError::Core(e));
    }

    tracing::info!(%user_id, challenge_id = %challenge.id, "Verification code sent");
    Ok(ChallengeIssued {
        phone_number,
        expires_at: challenge.expires_at,
    })
}

/// Check a submitted code and, on a match, record the phone as verified.
pub async fn submit_challenge(
    state: &AppState,
    user_id: DbId,
    raw_phone: &str,
    code: &str,
) -> AppResult<User> {
    let phone_number = normalize_phone(raw_phone, &state.config.default_country_code)?;

    let challenge = state
        .store
        .find_pending_challenge(user_id, &phone_number)
        .await?
        .ok_or_else(|| CoreError::not_found("phone_challenge", &phone_number))?;

    if let Err(e) = check_submission(&challenge.code, challenge.expires_at, code, Utc::now()) {
        if matches!(e, CoreError::Expired(_)) {
            state.store.delete_challenge(challenge.id).await?;
            tracing::info!(%user_id, challenge_id = %challenge.id, "Expired challenge purged");
        }
        return Err(AppError::Core(e));
    }

    let user = state
        .store
        .complete_challenge(challenge.id, user_id, &phone_number)
        .await?
        .ok_or_else(|| CoreError::Conflict("Verification code was already used".into()))?;

    tracing::info!(%user_id, "Phone number verified");
    Ok(user)
}
