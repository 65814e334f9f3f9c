//! Create releases table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Release::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Release::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Release::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Release::Version).string_len(100).not_null())
                    .col(ColumnDef::new(Release::Description).text())
                    .col(ColumnDef::new(Release::ReleasedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Release::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_releases_project_version")
                    .table(Release::Table)
                    .col(Release::ProjectId)
                    .col(Release::Version)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Release::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Release {
    #[sea_orm(iden = "releases")]
    Table,
    Id,
    ProjectId,
    Version,
    Description,
    ReleasedAt,
    CreatedAt,
}
