//! Create plan_cases table.
//!
//! No unique index on (plan_id, position): positions are shifted with bulk
//! updates inside a transaction and may collide transiently.

use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_test_cases::TestCase;
use super::m20260301_000006_create_test_plans::TestPlan;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlanCase::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlanCase::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PlanCase::PlanId).uuid().not_null())
                    .col(ColumnDef::new(PlanCase::TestCaseId).uuid().not_null())
                    .col(ColumnDef::new(PlanCase::Position).integer().not_null())
                    .col(
                        ColumnDef::new(PlanCase::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PlanCase::Table, PlanCase::PlanId)
                            .to(TestPlan::Table, TestPlan::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PlanCase::Table, PlanCase::TestCaseId)
                            .to(TestCase::Table, TestCase::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plan_cases_unique_case")
                    .table(PlanCase::Table)
                    .col(PlanCase::PlanId)
                    .col(PlanCase::TestCaseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlanCase::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PlanCase {
    #[sea_orm(iden = "plan_cases")]
    Table,
    Id,
    PlanId,
    TestCaseId,
    Position,
    CreatedAt,
}
