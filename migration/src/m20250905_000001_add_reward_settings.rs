use sea_orm_migration::prelude::*;

use crate::enum_types::enum_column;

#[derive(DeriveIden)]
enum RewardRateSetting {
    #[sea_orm(iden = "RewardRateSetting")]
    Table,
    Id,
    Plan,
    Rate,
    #[sea_orm(iden = "updatedAt")]
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NonRewardDay {
    #[sea_orm(iden = "NonRewardDay")]
    Table,
    Id,
    Date,
    Reason,
    #[sea_orm(iden = "createdBy")]
    CreatedBy,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Reward configuration tables. Neither table references User:
/// - RewardRateSetting holds one rate per plan (plan_type is created by the initial migration)
/// - NonRewardDay holds one row per excluded calendar date
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RewardRateSetting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RewardRateSetting::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        enum_column(manager, RewardRateSetting::Plan, "plan_type")
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RewardRateSetting::Rate).double().not_null())
                    .col(
                        ColumnDef::new(RewardRateSetting::UpdatedAt)
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
                    .table(NonRewardDay::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NonRewardDay::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NonRewardDay::Date)
                            .date()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(NonRewardDay::Reason).string().null())
                    .col(ColumnDef::new(NonRewardDay::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(NonRewardDay::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(NonRewardDay::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(RewardRateSetting::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
