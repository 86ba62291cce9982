//! Purchase status and the rules for reconciling gateway notifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Prefix of every merchant order identifier.
const MERCHANT_OID_PREFIX: &str = "MG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Success,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown purchase status '{other}'"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PurchaseStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// What to do with an incoming terminal status given the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stored status is pending: record the incoming result.
    Apply,
    /// Same terminal result already recorded (gateway retry): nothing to do.
    Duplicate,
    /// A different terminal result is recorded: keep it and surface the clash.
    Conflict,
}

/// Decide how a notification carrying `incoming` affects a purchase in `current`.
///
/// Terminal statuses never change once written.
pub fn decide_transition(
    current: PurchaseStatus,
    incoming: PurchaseStatus,
) -> Result<Transition, CoreError> {
    if !incoming.is_terminal() {
        return Err(CoreError::Validation(
            "A notification must carry a terminal status".into(),
        ));
    }
    Ok(match current {
        PurchaseStatus::Pending => Transition::Apply,
        stored if stored == incoming => Transition::Duplicate,
        _ => Transition::Conflict,
    })
}

/// Generate a unique, alphanumeric-only merchant order identifier.
pub fn generate_merchant_oid() -> String {
    format!("{MERCHANT_OID_PREFIX}{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pending_accepts_either_terminal_status() {
        assert_eq!(
            decide_transition(PurchaseStatus::Pending, PurchaseStatus::Success).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            decide_transition(PurchaseStatus::Pending, PurchaseStatus::Failed).unwrap(),
            Transition::Apply
        );
    }

    #[test]
    fn repeated_result_is_a_duplicate() {
        assert_eq!(
            decide_transition(PurchaseStatus::Success, PurchaseStatus::Success).unwrap(),
            Transition::Duplicate
        );
        assert_eq!(
            decide_transition(PurchaseStatus::Failed, PurchaseStatus::Failed).unwrap(),
            Transition::Duplicate
        );
    }

    #[test]
    fn contradicting_result_is_a_conflict() {
        assert_eq!(
            decide_transition(PurchaseStatus::Success, PurchaseStatus::Failed).unwrap(),
            Transition::Conflict
        );
        assert_eq!(
            decide_transition(PurchaseStatus::Failed, PurchaseStatus::Success).unwrap(),
            Transition::Conflict
        );
    }

    #[test]
    fn pending_is_not_a_valid_notification() {
        assert_matches!(
            decide_transition(PurchaseStatus::Pending, PurchaseStatus::Pending),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn merchant_oid_is_alphanumeric_and_unique() {
        let a = generate_merchant_oid();
        let b = generate_merchant_oid();
        assert!(a.starts_with("MG"));
        assert_eq!(a.len(), 34);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
