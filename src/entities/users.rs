use super::enums::PlanType;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "User")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(column_name = "customerId", unique)]
    pub customer_id: String,
    #[sea_orm(column_name = "customerNumber", unique)]
    pub customer_number: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(column_name = "accountNumber", unique)]
    pub account_number: String,
    #[sea_orm(column_name = "phoneNumber", unique)]
    pub phone_number: String,
    /// bcrypt hash, never the plain password
    pub password: String,
    pub plan: PlanType,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "isEmailVerified")]
    pub is_email_verified: bool,
    #[sea_orm(column_name = "isPhoneVerified")]
    pub is_phone_verified: bool,
    #[sea_orm(column_name = "firstLogin")]
    pub first_login: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::balances::Entity")]
    Balances,
    #[sea_orm(has_many = "super::withdrawals::Entity")]
    Withdrawals,
    #[sea_orm(has_many = "super::deposits::Entity")]
    Deposits,
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
    #[sea_orm(has_many = "super::fcm_tokens::Entity")]
    FcmTokens,
}

impl Related<super::balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Balances.def()
    }
}

impl Related<super::withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl Related<super::deposits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deposits.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl Related<super::fcm_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FcmTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
