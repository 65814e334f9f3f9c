//! Create test_runs table.
//!
//! A run snapshot outlives its plan: deleting the plan nulls `plan_id`.

use sea_orm_migration::prelude::*;

use super::m20260301_000005_create_releases::Release;
use super::m20260301_000006_create_test_plans::TestPlan;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestRun::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestRun::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestRun::PlanId).uuid())
                    .col(ColumnDef::new(TestRun::ReleaseId).uuid().not_null())
                    .col(ColumnDef::new(TestRun::Status).string_len(20).not_null())
                    .col(ColumnDef::new(TestRun::StartedBy).uuid())
                    .col(
                        ColumnDef::new(TestRun::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestRun::FinishedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestRun::Table, TestRun::ReleaseId)
                            .to(Release::Table, Release::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestRun::Table, TestRun::PlanId)
                            .to(TestPlan::Table, TestPlan::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_runs_status")
                    .table(TestRun::Table)
                    .col(TestRun::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestRun::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestRun {
    #[sea_orm(iden = "test_runs")]
    Table,
    Id,
    PlanId,
    ReleaseId,
    Status,
    StartedBy,
    StartedAt,
    FinishedAt,
}
