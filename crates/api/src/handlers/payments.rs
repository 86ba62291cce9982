//! Handlers for the `/payments` resource.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Form, Json};
use marketgate_core::error::CoreError;
use marketgate_core::plans::{Plan, PLANS};
use marketgate_db::models::purchase::PurchaseResponse;
use marketgate_gateways::paytr::{CallbackPayload, CALLBACK_ACK};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_body;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::services::payments::{handle_callback, initiate, ContactInfo};
use crate::state::AppState;

/// Used when no proxy header names the client.
const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /payments/initiate`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub plan_id: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 400))]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub merchant_oid: String,
    pub plan: Plan,
    /// Major units with two decimals, e.g. `"99.90"`.
    pub amount: String,
    pub token: String,
    pub redirect_url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/payments/plans
pub async fn list_plans() -> Json<DataResponse<Vec<Plan>>> {
    Json(DataResponse {
        data: PLANS.to_vec(),
    })
}

/// POST /api/v1/payments/initiate
pub async fn initiate_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(input): Json<InitiatePaymentRequest>,
) -> AppResult<Json<DataResponse<InitiatePaymentResponse>>> {
    validate_body(&input)?;
    let contact = ContactInfo {
        name: input.name,
        phone: input.phone,
        address: input.address,
    };
    let user_ip = client_ip(&headers);

    let initiated = initiate(&state, &user, &input.plan_id, &contact, &user_ip).await?;

    Ok(Json(DataResponse {
        data: InitiatePaymentResponse {
            merchant_oid: initiated.purchase.merchant_oid,
            plan: *initiated.plan,
            amount: initiated.plan.display_amount(),
            token: initiated.session.token,
            redirect_url: initiated.session.redirect_url,
        },
    }))
}

/// GET /api/v1/payments/{merchant_oid}
///
/// Owners only; anyone else sees 404.
pub async fn get_purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(merchant_oid): Path<String>,
) -> AppResult<Json<DataResponse<PurchaseResponse>>> {
    let purchase = state
        .store
        .find_purchase(&merchant_oid)
        .await?
        .filter(|p| p.user_id == auth.user_id)
        .ok_or_else(|| CoreError::not_found("purchase", &merchant_oid))?;

    Ok(Json(DataResponse {
        data: PurchaseResponse::from(&purchase),
    }))
}

/// POST /api/v1/payments/callback
///
/// Server-to-server notification from the gateway. Always answers `OK`:
/// failures are logged for operators and never reported back, since the
/// gateway keeps retrying anything else.
///
/// Processing runs on its own task under the upstream deadline, so neither a
/// stalled store nor a panic can change the acknowledgment. A settle that
/// outlives the deadline still completes in the background.
pub async fn callback(
    State(state): State<AppState>,
    payload: Result<Form<CallbackPayload>, FormRejection>,
) -> &'static str {
    let Form(payload) = match payload {
        Ok(form) => form,
        Err(rejection) => {
            tracing::error!(error = %rejection, "Unreadable payment callback");
            return CALLBACK_ACK;
        }
    };

    let merchant_oid = payload.merchant_oid.clone();
    let limit = state.config.upstream_timeout();
    let task = tokio::spawn(async move { handle_callback(&state, &payload).await });

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(Ok(outcome))) => {
            tracing::debug!(%merchant_oid, ?outcome, "Payment callback processed");
        }
        Ok(Ok(Err(e))) => {
            tracing::error!(
                %merchant_oid,
                code = e.code(),
                error = %e,
                "Payment callback not applied"
            );
        }
        Ok(Err(join_error)) => {
            tracing::error!(%merchant_oid, error = %join_error, "Payment callback task failed");
        }
        Err(_) => {
            tracing::error!(
                %merchant_oid,
                timeout_secs = limit.as_secs(),
                "Payment callback still processing at deadline; acknowledging anyway"
            );
        }
    }

    CALLBACK_ACK
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Client address as reported by the fronting proxy.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_string()
}
