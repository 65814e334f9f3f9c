//! Test plan models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ReleaseResponse;
use crate::entity::test_plan;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenamePlanRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClonePlanRequest {
    /// Release the copy is linked to
    pub release_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPlanCaseRequest {
    pub test_case_id: Uuid,
}

/// Target 1-based position for an ordered item.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveRequest {
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<test_plan::Model> for PlanResponse {
    fn from(p: test_plan::Model) -> Self {
        Self {
            id: p.id,
            project_id: p.project_id,
            name: p.name,
            description: p.description,
            created_by: p.created_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// A plan together with one release it is linked to.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanWithRelease {
    pub plan: PlanResponse,
    pub release: ReleaseResponse,
}

/// One ordered entry of a plan, joined with its test case.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlanCaseView {
    pub test_case_id: Uuid,
    pub position: i32,
    pub title: String,
    pub status: String,
    pub group_id: Uuid,
    pub group_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanDetailResponse {
    pub plan: PlanResponse,
    pub cases: Vec<PlanCaseView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClonePlanResponse {
    pub plan: PlanResponse,
    /// Copied test case ids in position order
    pub test_case_ids: Vec<Uuid>,
}
