use crate::entities::PlanType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RewardRateUnique {
    Id(String),
    Plan(PlanType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NonRewardDayUnique {
    Id(String),
    Date(NaiveDate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNonRewardDayInput {
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNonRewardDayInput {
    pub reason: Option<Option<String>>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonRewardDayFilter {
    pub from: Option<NaiveDate>,
    /// inclusive
    pub to: Option<NaiveDate>,
    pub created_by: Option<String>,
}
