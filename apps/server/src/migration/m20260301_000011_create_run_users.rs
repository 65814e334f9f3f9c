//! Create run_users table.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::User;
use super::m20260301_000009_create_test_runs::TestRun;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RunUser::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RunUser::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RunUser::RunId).uuid().not_null())
                    .col(ColumnDef::new(RunUser::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(RunUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RunUser::Table, RunUser::RunId)
                            .to(TestRun::Table, TestRun::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RunUser::Table, RunUser::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_run_users_unique")
                    .table(RunUser::Table)
                    .col(RunUser::RunId)
                    .col(RunUser::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RunUser::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RunUser {
    #[sea_orm(iden = "run_users")]
    Table,
    Id,
    RunId,
    UserId,
    CreatedAt,
}
