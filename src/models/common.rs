use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, Order};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Inclusive-start, exclusive-end time window. Either side may be open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
        let mut cond = Condition::all();
        if let Some(from) = self.from {
            cond = cond.add(column.gte(from));
        }
        if let Some(to) = self.to {
            cond = cond.add(column.lt(to));
        }
        cond
    }
}

/// Atomic update of a numeric column, evaluated by the database.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NumberUpdate {
    Set(f64),
    Increment(f64),
    Decrement(f64),
    Multiply(f64),
    Divide(f64),
}

impl NumberUpdate {
    pub fn validate(&self, field: &str) -> AppResult<()> {
        let operand = match *self {
            NumberUpdate::Set(v)
            | NumberUpdate::Increment(v)
            | NumberUpdate::Decrement(v)
            | NumberUpdate::Multiply(v)
            | NumberUpdate::Divide(v) => v,
        };
        if !operand.is_finite() {
            return Err(AppError::ValidationError(format!(
                "{field} update must be a finite number"
            )));
        }
        if matches!(self, NumberUpdate::Divide(v) if *v == 0.0) {
            return Err(AppError::ValidationError(format!(
                "{field} cannot be divided by zero"
            )));
        }
        Ok(())
    }

    pub fn expr<C: ColumnTrait>(&self, column: C) -> SimpleExpr {
        match *self {
            NumberUpdate::Set(v) => Expr::value(v),
            NumberUpdate::Increment(v) => Expr::col(column).add(v),
            NumberUpdate::Decrement(v) => Expr::col(column).sub(v),
            NumberUpdate::Multiply(v) => Expr::col(column).mul(v),
            NumberUpdate::Divide(v) => Expr::col(column).div(v),
        }
    }
}

pub fn validate_amount(field: &str, amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::ValidationError(format!(
            "{field} must be a positive number"
        )));
    }
    Ok(())
}

pub fn validate_finite(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::ValidationError(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(())
}
