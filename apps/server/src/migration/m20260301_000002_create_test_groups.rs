//! Create test_groups table.
//!
//! Groups form a forest per project. Deleting a group cascades to its
//! descendant groups (self-referencing foreign key) and their test cases.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestGroup::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestGroup::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestGroup::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestGroup::ParentId).uuid())
                    .col(ColumnDef::new(TestGroup::Name).string_len(255).not_null())
                    .col(ColumnDef::new(TestGroup::Description).text())
                    .col(
                        ColumnDef::new(TestGroup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestGroup::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestGroup::Table, TestGroup::ParentId)
                            .to(TestGroup::Table, TestGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_groups_project_id")
                    .table(TestGroup::Table)
                    .col(TestGroup::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_groups_parent_id")
                    .table(TestGroup::Table)
                    .col(TestGroup::ParentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestGroup::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestGroup {
    #[sea_orm(iden = "test_groups")]
    Table,
    Id,
    ProjectId,
    ParentId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}
