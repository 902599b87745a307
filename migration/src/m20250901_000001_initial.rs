use sea_orm_migration::prelude::*;

use crate::enum_types::{create_enum, drop_enum, enum_column};

#[derive(DeriveIden)]
pub enum User {
    #[sea_orm(iden = "User")]
    Table,
    Id,
    #[sea_orm(iden = "customerId")]
    CustomerId,
    #[sea_orm(iden = "customerNumber")]
    CustomerNumber,
    Email,
    #[sea_orm(iden = "accountNumber")]
    AccountNumber,
    #[sea_orm(iden = "phoneNumber")]
    PhoneNumber,
    Password,
    Plan,
    #[sea_orm(iden = "isActive")]
    IsActive,
    #[sea_orm(iden = "isEmailVerified")]
    IsEmailVerified,
    #[sea_orm(iden = "isPhoneVerified")]
    IsPhoneVerified,
    #[sea_orm(iden = "firstLogin")]
    FirstLogin,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
    #[sea_orm(iden = "updatedAt")]
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Balance {
    #[sea_orm(iden = "Balance")]
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    Plan,
    Balance,
    #[sea_orm(iden = "pendingBalance")]
    PendingBalance,
    #[sea_orm(iden = "rewardBalance")]
    RewardBalance,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
    #[sea_orm(iden = "updatedAt")]
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Withdrawal {
    #[sea_orm(iden = "Withdrawal")]
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    Amount,
    #[sea_orm(iden = "balanceBefore")]
    BalanceBefore,
    Type,
    Status,
    Remarks,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
    #[sea_orm(iden = "updatedAt")]
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Deposit {
    #[sea_orm(iden = "Deposit")]
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    Amount,
    #[sea_orm(iden = "balanceBefore")]
    BalanceBefore,
    Status,
    Remarks,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
    #[sea_orm(iden = "updatedAt")]
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_enum(manager, "plan_type", &["plant", "seed", "tree"]).await?;
        create_enum(manager, "withdrawal_type", &["full", "rewardOnly"]).await?;
        create_enum(
            manager,
            "transaction_status",
            &["pending", "proceed", "failed"],
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(User::CustomerId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(User::CustomerNumber)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(User::AccountNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(User::PhoneNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::Password).string().not_null())
                    .col(
                        enum_column(manager, User::Plan, "plan_type")
                            .not_null()
                            .default("plant"),
                    )
                    .col(
                        ColumnDef::new(User::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(User::IsEmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(User::IsPhoneVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(User::FirstLogin)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Balance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balance::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Balance::UserId).string().not_null())
                    .col(enum_column(manager, Balance::Plan, "plan_type").not_null())
                    .col(
                        ColumnDef::new(Balance::Balance)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Balance::PendingBalance)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Balance::RewardBalance)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Balance::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Balance::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("Balance_userId_fkey")
                            .from(Balance::Table, Balance::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one balance row per (user, plan)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("Balance_userId_plan_key")
                    .table(Balance::Table)
                    .col(Balance::UserId)
                    .col(Balance::Plan)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Withdrawal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Withdrawal::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Withdrawal::UserId).string().not_null())
                    .col(ColumnDef::new(Withdrawal::Amount).double().not_null())
                    .col(ColumnDef::new(Withdrawal::BalanceBefore).double().not_null())
                    .col(enum_column(manager, Withdrawal::Type, "withdrawal_type").not_null())
                    .col(
                        enum_column(manager, Withdrawal::Status, "transaction_status")
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Withdrawal::Remarks).string().null())
                    .col(
                        ColumnDef::new(Withdrawal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Withdrawal::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("Withdrawal_userId_fkey")
                            .from(Withdrawal::Table, Withdrawal::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("Withdrawal_userId_idx")
                    .table(Withdrawal::Table)
                    .col(Withdrawal::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deposit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deposit::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deposit::UserId).string().not_null())
                    .col(ColumnDef::new(Deposit::Amount).double().not_null())
                    .col(ColumnDef::new(Deposit::BalanceBefore).double().not_null())
                    .col(
                        enum_column(manager, Deposit::Status, "transaction_status")
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Deposit::Remarks).string().null())
                    .col(
                        ColumnDef::new(Deposit::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Deposit::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("Deposit_userId_fkey")
                            .from(Deposit::Table, Deposit::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("Deposit_userId_idx")
                    .table(Deposit::Table)
                    .col(Deposit::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // children first
        manager
            .drop_table(Table::drop().if_exists().table(Deposit::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Withdrawal::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Balance::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(User::Table).to_owned())
            .await?;

        drop_enum(manager, "transaction_status").await?;
        drop_enum(manager, "withdrawal_type").await?;
        drop_enum(manager, "plan_type").await?;

        Ok(())
    }
}
