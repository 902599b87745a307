//! Deposit and withdrawal inputs. Both record a money movement with a
//! caller-supplied balance snapshot and a shared status lifecycle.

use crate::entities::{TransactionStatus, WithdrawalType};
use crate::models::{DateRange, SortOrder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWithdrawalInput {
    pub user_id: String,
    pub amount: f64,
    pub balance_before: f64,
    pub kind: WithdrawalType,
    pub status: Option<TransactionStatus>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepositInput {
    pub user_id: String,
    pub amount: f64,
    pub balance_before: f64,
    pub status: Option<TransactionStatus>,
    pub remarks: Option<String>,
}

/// Patch for a deposit or withdrawal. `remarks: Some(None)` clears the remarks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTransactionInput {
    pub status: Option<TransactionStatus>,
    pub remarks: Option<Option<String>>,
}

impl UpdateTransactionInput {
    pub fn status(status: TransactionStatus) -> Self {
        Self {
            status: Some(status),
            remarks: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.remarks.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WithdrawalFilter {
    pub user_id: Option<String>,
    pub status: Option<TransactionStatus>,
    pub kind: Option<WithdrawalType>,
    #[serde(default)]
    pub created: DateRange,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositFilter {
    pub user_id: Option<String>,
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub created: DateRange,
    #[serde(default)]
    pub order: SortOrder,
}
