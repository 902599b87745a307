use crate::entities::PlanType;
use crate::models::NumberUpdate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalanceUnique {
    Id(String),
    UserPlan { user_id: String, plan: PlanType },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBalanceInput {
    pub user_id: String,
    pub plan: PlanType,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub pending_balance: f64,
    #[serde(default)]
    pub reward_balance: f64,
}

impl CreateBalanceInput {
    /// Zeroed balance row.
    pub fn new(user_id: &str, plan: PlanType) -> Self {
        Self {
            user_id: user_id.to_string(),
            plan,
            balance: 0.0,
            pending_balance: 0.0,
            reward_balance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBalanceInput {
    pub balance: Option<NumberUpdate>,
    pub pending_balance: Option<NumberUpdate>,
    pub reward_balance: Option<NumberUpdate>,
}

impl UpdateBalanceInput {
    pub fn is_empty(&self) -> bool {
        self.balance.is_none() && self.pending_balance.is_none() && self.reward_balance.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceFilter {
    pub user_id: Option<String>,
    pub plan: Option<PlanType>,
    /// balance >= this value
    pub min_balance: Option<f64>,
}

/// Column sums over a set of balance rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub count: i64,
    pub balance: f64,
    pub pending_balance: f64,
    pub reward_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBalanceTotals {
    pub plan: PlanType,
    pub totals: BalanceTotals,
}
