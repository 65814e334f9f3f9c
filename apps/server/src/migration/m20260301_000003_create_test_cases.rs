//! Create test_cases table.

use sea_orm_migration::prelude::*;

use super::m20260301_000002_create_test_groups::TestGroup;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestCase::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestCase::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestCase::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestCase::GroupId).uuid().not_null())
                    .col(ColumnDef::new(TestCase::Title).string_len(500).not_null())
                    .col(ColumnDef::new(TestCase::Description).text().not_null())
                    .col(ColumnDef::new(TestCase::ExpectedResult).text().not_null())
                    .col(ColumnDef::new(TestCase::Status).string_len(20).not_null())
                    .col(ColumnDef::new(TestCase::CreatedBy).uuid())
                    .col(
                        ColumnDef::new(TestCase::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestCase::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCase::Table, TestCase::GroupId)
                            .to(TestGroup::Table, TestGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_cases_group_id")
                    .table(TestCase::Table)
                    .col(TestCase::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_cases_project_id")
                    .table(TestCase::Table)
                    .col(TestCase::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestCase::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestCase {
    #[sea_orm(iden = "test_cases")]
    Table,
    Id,
    ProjectId,
    GroupId,
    Title,
    Description,
    ExpectedResult,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
