//! Test case and test point models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{test_case, test_point};

/// Authoring lifecycle of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestCaseStatus {
    Draft,
    Ready,
    Deprecated,
}

impl TestCaseStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Deprecated => "deprecated",
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "ready" => Some(Self::Ready),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestCaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTestCaseRequest {
    pub group_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected_result: String,
}

/// Partial update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTestCaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub expected_result: Option<String>,
    /// Target group; must belong to the same project
    pub group_id: Option<Uuid>,
    pub status: Option<TestCaseStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TestCaseResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: String,
    pub expected_result: String,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<test_case::Model> for TestCaseResponse {
    fn from(c: test_case::Model) -> Self {
        Self {
            id: c.id,
            project_id: c.project_id,
            group_id: c.group_id,
            title: c.title,
            description: c.description,
            expected_result: c.expected_result,
            status: c.status,
            created_by: c.created_by,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Test case as listed within a project, with the name of its group.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TestCaseListItem {
    #[serde(flatten)]
    pub case: TestCaseResponse,
    pub group_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTestPointRequest {
    pub description: String,
    /// 1-based insertion position; appended when omitted
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTestPointRequest {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TestPointResponse {
    pub id: Uuid,
    pub test_case_id: Uuid,
    pub description: String,
    pub position: i32,
}

impl From<test_point::Model> for TestPointResponse {
    fn from(p: test_point::Model) -> Self {
        Self {
            id: p.id,
            test_case_id: p.test_case_id,
            description: p.description,
            position: p.position,
        }
    }
}
