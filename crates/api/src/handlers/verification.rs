//! Handlers for the `/verification/phone` resource.

use axum::extract::State;
use axum::Json;
use marketgate_db::models::user::UserResponse;
use serde::Deserialize;
use validator::Validate;

use super::validate_body;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::verification::{request_challenge, submit_challenge, ChallengeIssued};
use crate::state::AppState;

/// Request body for `POST /verification/phone/request`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRequest {
    #[validate(length(min = 1, max = 32))]
    pub phone_number: String,
}

/// Request body for `POST /verification/phone/verify`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhoneVerifyRequest {
    #[validate(length(min = 1, max = 32))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

/// POST /api/v1/verification/phone/request
pub async fn request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<PhoneRequest>,
) -> AppResult<Json<DataResponse<ChallengeIssued>>> {
    validate_body(&input)?;
    let issued = request_challenge(&state, auth.user_id, &input.phone_number).await?;
    Ok(Json(DataResponse { data: issued }))
}

/// POST /api/v1/verification/phone/verify
pub async fn verify(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<PhoneVerifyRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    validate_body(&input)?;
    let user = submit_challenge(&state, auth.user_id, &input.phone_number, &input.code).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}
