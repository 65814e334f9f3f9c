//! Create run_cases table.
//!
//! A test case captured by a run cannot be deleted.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::User;
use super::m20260301_000003_create_test_cases::TestCase;
use super::m20260301_000009_create_test_runs::TestRun;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RunCase::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RunCase::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RunCase::RunId).uuid().not_null())
                    .col(ColumnDef::new(RunCase::TestCaseId).uuid().not_null())
                    .col(ColumnDef::new(RunCase::Status).string_len(20).not_null())
                    .col(ColumnDef::new(RunCase::AssignedTo).uuid())
                    .col(ColumnDef::new(RunCase::Comment).text())
                    .col(ColumnDef::new(RunCase::ExecutedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(RunCase::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RunCase::Table, RunCase::RunId)
                            .to(TestRun::Table, TestRun::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RunCase::Table, RunCase::TestCaseId)
                            .to(TestCase::Table, TestCase::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RunCase::Table, RunCase::AssignedTo)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_run_cases_unique_case")
                    .table(RunCase::Table)
                    .col(RunCase::RunId)
                    .col(RunCase::TestCaseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RunCase::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RunCase {
    #[sea_orm(iden = "run_cases")]
    Table,
    Id,
    RunId,
    TestCaseId,
    Status,
    AssignedTo,
    Comment,
    ExecutedAt,
    UpdatedAt,
}
