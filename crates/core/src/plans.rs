//! Fixed catalog of premium plans.
//!
//! Amounts are in minor currency units (kuruş) to keep gateway arithmetic exact.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Currency every plan is priced in.
pub const PLAN_CURRENCY: &str = "TL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Monthly,
    Annual,
}

impl PlanId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "annual" => Ok(Self::Annual),
            other => Err(CoreError::InvalidPlan(other.to_string())),
        }
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PlanId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// One purchasable premium plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub name: &'static str,
    pub amount_minor: i64,
    pub currency: &'static str,
    pub duration_days: i64,
}

pub const PLANS: [Plan; 2] = [
    Plan {
        id: PlanId::Monthly,
        name: "Premium Monthly",
        amount_minor: 9_990,
        currency: PLAN_CURRENCY,
        duration_days: 30,
    },
    Plan {
        id: PlanId::Annual,
        name: "Premium Annual",
        amount_minor: 99_990,
        currency: PLAN_CURRENCY,
        duration_days: 365,
    },
];

impl Plan {
    /// Look up a plan by its public identifier.
    pub fn find(id: &str) -> Result<&'static Plan, CoreError> {
        let id = PlanId::parse(id)?;
        PLANS
            .iter()
            .find(|plan| plan.id == id)
            .ok_or_else(|| CoreError::InvalidPlan(id.to_string()))
    }

    /// Amount in major units with two decimals, e.g. `"99.90"`.
    pub fn display_amount(&self) -> String {
        format_minor(self.amount_minor)
    }
}

/// Format minor units as a decimal string with two places.
pub fn format_minor(amount_minor: i64) -> String {
    format!("{}.{:02}", amount_minor / 100, amount_minor % 100)
}
