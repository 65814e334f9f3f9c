//! TestCase entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: String,
    pub expected_result: String,
    /// draft, ready, deprecated
    pub status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_group::Entity",
        from = "Column::GroupId",
        to = "super::test_group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(has_many = "super::test_point::Entity")]
    TestPoints,
}

impl Related<super::test_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::test_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestPoints.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
