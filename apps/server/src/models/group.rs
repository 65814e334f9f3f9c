//! Test group DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::test_group;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; omitted fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<test_group::Model> for GroupResponse {
    fn from(g: test_group::Model) -> Self {
        Self {
            id: g.id,
            project_id: g.project_id,
            parent_id: g.parent_id,
            name: g.name,
            description: g.description,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

/// Number of test cases filed directly under a group.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupCaseCount {
    pub group_id: Uuid,
    pub name: String,
    pub total_cases: u64,
}
