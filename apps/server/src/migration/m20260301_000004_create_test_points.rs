//! Create test_points table.

use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_test_cases::TestCase;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestPoint::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestPoint::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestPoint::TestCaseId).uuid().not_null())
                    .col(ColumnDef::new(TestPoint::Description).text().not_null())
                    .col(ColumnDef::new(TestPoint::Position).integer().not_null())
                    .col(
                        ColumnDef::new(TestPoint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestPoint::Table, TestPoint::TestCaseId)
                            .to(TestCase::Table, TestCase::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_points_case_position")
                    .table(TestPoint::Table)
                    .col(TestPoint::TestCaseId)
                    .col(TestPoint::Position)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestPoint::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TestPoint {
    #[sea_orm(iden = "test_points")]
    Table,
    Id,
    TestCaseId,
    Description,
    Position,
    CreatedAt,
}
