//! Premium purchases: opening hosted payment sessions and reconciling the
//! gateway's asynchronous notifications.

use marketgate_core::error::CoreError;
use marketgate_core::payment::{generate_merchant_oid, PurchaseStatus};
use marketgate_core::plans::Plan;
use marketgate_db::models::purchase::{CreatePurchase, Purchase};
use marketgate_db::models::user::User;
use marketgate_db::SettleOutcome;
use marketgate_gateways::paytr::{BasketItem, CallbackPayload, SessionRequest};
use marketgate_gateways::PaymentSession;

use super::call_upstream;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Placeholder sent when the buyer gave no address; the hosted page requires one.
const ADDRESS_PLACEHOLDER: &str = "N/A";

/// Buyer details the hosted page displays. Missing fields fall back to the
/// stored user record.
#[derive(Debug, Clone, Default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A pending purchase and where to send the browser.
#[derive(Debug, Clone)]
pub struct Initiated {
    pub purchase: Purchase,
    pub plan: &'static Plan,
    pub session: PaymentSession,
}

/// How a verified callback was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The purchase moved from pending to this status.
    Applied(PurchaseStatus),
    /// The same result was already recorded.
    Duplicate,
}

/// Open a hosted payment session for `plan_id` and record a pending purchase.
pub async fn initiate(
    state: &AppState,
    user: &User,
    plan_id: &str,
    contact: &ContactInfo,
    user_ip: &str,
) -> AppResult<Initiated> {
    // 1. Resolve the plan from the fixed catalog.
    let plan = Plan::find(plan_id)?;

    // 2. Fill in contact details the gateway requires.
    let user_phone = contact
        .phone
        .clone()
        .or_else(|| user.phone_number.clone())
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("A phone number is required for payment".into()))?;
    let user_name = contact
        .name
        .clone()
        .or_else(|| user.name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| user.email.clone());
    let user_address = contact
        .address
        .clone()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| ADDRESS_PLACEHOLDER.to_string());

    // 3. Open the hosted session under a fresh merchant order id.
    let merchant_oid = generate_merchant_oid();
    let request = SessionRequest {
        merchant_oid: merchant_oid.clone(),
        email: user.email.clone(),
        user_ip: user_ip.to_string(),
        user_name,
        user_address,
        user_phone,
        amount_minor: plan.amount_minor,
        currency: plan.currency.to_string(),
        basket: vec![BasketItem {
            name: plan.name.to_string(),
            amount_minor: plan.amount_minor,
            quantity: 1,
        }],
    };
    let session = call_upstream(
        "payments",
        state.config.upstream_timeout(),
        state.payments.create_session(&request),
    )
    .await?;

    // 4. Record the pending purchase before handing the redirect back.
    let purchase = state
        .store
        .create_purchase(&CreatePurchase {
            merchant_oid,
            user_id: user.id,
            plan_id: plan.id,
            amount_minor: plan.amount_minor,
            currency: plan.currency.to_string(),
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        merchant_oid = %purchase.merchant_oid,
        plan = %plan.id,
        "Payment initiated"
    );

    Ok(Initiated {
        purchase,
        plan,
        session,
    })
}

/// Apply a gateway notification.
///
/// Nothing is written unless the signature verifies. A notification that
/// contradicts an already recorded result is reported as a conflict and the
/// stored result is kept.
pub async fn handle_callback(
    state: &AppState,
    payload: &CallbackPayload,
) -> AppResult<CallbackOutcome> {
    // 1. Authenticate the notification.
    if !state.payments.verify_callback(payload) {
        tracing::warn!(merchant_oid = %payload.merchant_oid, "Payment callback signature mismatch");
        return Err(AppError::Core(CoreError::InvalidSignature(
            "Payment callback hash mismatch".into(),
        )));
    }

    // 2. Apply the terminal status, granting premium on success.
    let incoming = payload.purchase_status()?;
    let failure_reason = payload.failure_reason();
    let outcome = state
        .store
        .settle_purchase(&payload.merchant_oid, incoming, failure_reason.as_deref())
        .await?
        .ok_or_else(|| CoreError::not_found("purchase", &payload.merchant_oid))?;

    match outcome {
        SettleOutcome::Applied(purchase) => {
            tracing::info!(
                merchant_oid = %purchase.merchant_oid,
                user_id = %purchase.user_id,
                status = %purchase.status,
                "Purchase settled"
            );
            Ok(CallbackOutcome::Applied(purchase.status))
        }
        SettleOutcome::AlreadyApplied(purchase) => {
            tracing::info!(
                merchant_oid = %purchase.merchant_oid,
                status = %purchase.status,
                "Duplicate payment callback ignored"
            );
            Ok(CallbackOutcome::Duplicate)
        }
        SettleOutcome::Conflict(purchase) => {
            tracing::error!(
                merchant_oid = %purchase.merchant_oid,
                stored = %purchase.status,
                incoming = %incoming,
                "Payment callback contradicts recorded result; operator review required"
            );
            Err(AppError::Core(CoreError::Conflict(format!(
                "Purchase {} is already {}",
                purchase.merchant_oid, purchase.status
            ))))
        }
    }
}
