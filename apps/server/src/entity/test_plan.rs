//! TestPlan entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::plan_case::Entity")]
    PlanCases,
    #[sea_orm(has_many = "super::release_plan::Entity")]
    ReleasePlans,
}

impl Related<super::plan_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlanCases.def()
    }
}

impl Related<super::release_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReleasePlans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
