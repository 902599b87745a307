use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// Calendar date excluded from reward accrual. One row per date.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "NonRewardDay")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub date: NaiveDate,
    pub reason: Option<String>,
    /// who registered the day (admin identifier, free text)
    #[sea_orm(column_name = "createdBy")]
    pub created_by: String,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
