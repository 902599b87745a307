use sea_orm_migration::prelude::*;

use crate::m20250901_000001_initial::User;
use crate::enum_types::{create_enum, drop_enum, enum_column};

#[derive(DeriveIden)]
enum Notification {
    #[sea_orm(iden = "Notification")]
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    Title,
    Message,
    Type,
    Channel,
    #[sea_orm(iden = "sentAt")]
    SentAt,
    #[sea_orm(iden = "isRead")]
    IsRead,
    Metadata,
}

#[derive(DeriveIden)]
enum FcmToken {
    #[sea_orm(iden = "FCMToken")]
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    Token,
    Platform,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_enum(
            manager,
            "notification_type",
            &["reward", "deposit", "withdrawal", "system", "promotion"],
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notification::UserId).string().not_null())
                    .col(ColumnDef::new(Notification::Title).string().not_null())
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(enum_column(manager, Notification::Type, "notification_type").not_null())
                    // JSON array of channel strings, e.g. ["push","inApp"]
                    .col(ColumnDef::new(Notification::Channel).json_binary().not_null())
                    .col(
                        ColumnDef::new(Notification::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notification::Metadata).json_binary().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("Notification_userId_fkey")
                            .from(Notification::Table, Notification::UserId)
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
                    .name("Notification_userId_idx")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FcmToken::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FcmToken::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FcmToken::UserId).string().not_null())
                    .col(
                        ColumnDef::new(FcmToken::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(FcmToken::Platform).string().not_null())
                    .col(
                        ColumnDef::new(FcmToken::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("FCMToken_userId_fkey")
                            .from(FcmToken::Table, FcmToken::UserId)
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
                    .name("FCMToken_userId_idx")
                    .table(FcmToken::Table)
                    .col(FcmToken::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(FcmToken::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Notification::Table)
                    .to_owned(),
            )
            .await?;

        drop_enum(manager, "notification_type").await?;

        Ok(())
    }
}
