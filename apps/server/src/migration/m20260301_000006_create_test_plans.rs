//! Create test_plans table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestPlan::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestPlan::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestPlan::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestPlan::Name).string_len(255).not_null())
                    .col(ColumnDef::new(TestPlan::Description).text().not_null())
                    .col(ColumnDef::new(TestPlan::CreatedBy).uuid())
                    .col(
                        ColumnDef::new(TestPlan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestPlan::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_plans_project_id")
                    .table(TestPlan::Table)
                    .col(TestPlan::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestPlan::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestPlan {
    #[sea_orm(iden = "test_plans")]
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
