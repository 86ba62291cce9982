//! Handlers for the `/entitlements` resource.

use axum::Json;
use marketgate_core::entitlement::is_premium_eligible;
use serde::Serialize;

use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumStatus {
    pub is_premium: bool,
}

/// GET /api/v1/entitlements/premium
///
/// Reads the stored flag, never the token.
pub async fn premium(CurrentUser(user): CurrentUser) -> Json<DataResponse<PremiumStatus>> {
    Json(DataResponse {
        data: PremiumStatus {
            is_premium: is_premium_eligible(&user),
        },
    })
}
