use crate::entities::TransactionStatus;
use serde::{Deserialize, Serialize};

/// count/sum/avg/min/max of an amount column. `sum` is 0 and the rest are
/// `None` when no row matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountAggregate {
    pub count: i64,
    pub sum: f64,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusGroup {
    pub status: TransactionStatus,
    pub count: i64,
    pub sum: f64,
}
