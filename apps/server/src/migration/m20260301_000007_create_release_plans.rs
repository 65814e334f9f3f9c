//! Create release_plans join table.
//!
//! Deleting a release removes its links but never the plans themselves.

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
                    .table(ReleasePlan::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ReleasePlan::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ReleasePlan::ReleaseId).uuid().not_null())
                    .col(ColumnDef::new(ReleasePlan::PlanId).uuid().not_null())
                    .col(
                        ColumnDef::new(ReleasePlan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReleasePlan::Table, ReleasePlan::ReleaseId)
                            .to(Release::Table, Release::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReleasePlan::Table, ReleasePlan::PlanId)
                            .to(TestPlan::Table, TestPlan::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_release_plans_unique")
                    .table(ReleasePlan::Table)
                    .col(ReleasePlan::ReleaseId)
                    .col(ReleasePlan::PlanId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReleasePlan::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ReleasePlan {
    #[sea_orm(iden = "release_plans")]
    Table,
    Id,
    ReleaseId,
    PlanId,
    CreatedAt,
}
