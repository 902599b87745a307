use crate::entities::{PlanType, balance_entity, user_entity};
use crate::models::DateRange;
use crate::models::SortOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Any of the user's unique keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserUnique {
    Id(String),
    CustomerId(String),
    CustomerNumber(i32),
    Email(String),
    AccountNumber(String),
    PhoneNumber(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub phone_number: String,
    /// plain text; hashed before it is stored
    pub password: String,
    pub plan: Option<PlanType>,
    /// generated when absent
    pub customer_id: Option<String>,
    /// next free number when absent
    pub customer_number: Option<i32>,
    /// generated when absent
    pub account_number: Option<String>,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub is_phone_verified: bool,
}

impl CreateUserInput {
    pub fn new(email: &str, phone_number: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            phone_number: phone_number.to_string(),
            password: password.to_string(),
            plan: None,
            customer_id: None,
            customer_number: None,
            account_number: None,
            is_email_verified: false,
            is_phone_verified: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// plain text; re-hashed
    pub password: Option<String>,
    pub plan: Option<PlanType>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub is_phone_verified: Option<bool>,
    pub first_login: Option<bool>,
}

impl UpdateUserInput {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.phone_number.is_none()
            && self.password.is_none()
            && self.plan.is_none()
            && self.is_active.is_none()
            && self.is_email_verified.is_none()
            && self.is_phone_verified.is_none()
            && self.first_login.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub plan: Option<PlanType>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub is_phone_verified: Option<bool>,
    /// substring match on email
    pub email_contains: Option<String>,
    #[serde(default)]
    pub created: DateRange,
    #[serde(default)]
    pub order: SortOrder,
}

/// User row without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub customer_id: String,
    pub customer_number: i32,
    pub email: String,
    pub account_number: String,
    pub phone_number: String,
    pub plan: PlanType,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub first_login: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        Self {
            id: m.id,
            customer_id: m.customer_id,
            customer_number: m.customer_number,
            email: m.email,
            account_number: m.account_number,
            phone_number: m.phone_number,
            plan: m.plan,
            is_active: m.is_active,
            is_email_verified: m.is_email_verified,
            is_phone_verified: m.is_phone_verified,
            first_login: m.first_login,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A user together with its balance rows (one per plan).
#[derive(Debug, Clone)]
pub struct UserWithBalances {
    pub user: user_entity::Model,
    pub balances: Vec<balance_entity::Model>,
}
