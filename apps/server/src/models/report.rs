//! Run report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Label reported for cases nobody is assigned to.
pub const UNASSIGNED_LABEL: &str = "unassigned";

/// Counts per execution status. Every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunSummary {
    #[serde(rename = "OK")]
    pub ok: u64,
    #[serde(rename = "NOK")]
    pub nok: u64,
    #[serde(rename = "BLOCKED")]
    pub blocked: u64,
    pub untested: u64,
    pub total: u64,
}

impl RunSummary {
    /// Cases with any status other than untested.
    pub fn executed(&self) -> u64 {
        self.ok + self.nok + self.blocked
    }
}

/// Status counts of one run with its completion percentage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct RunProgress {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub progress: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserCount {
    /// User name, or `unassigned`
    pub user: String,
    pub user_id: Option<Uuid>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunTestRow {
    pub test_case_id: Uuid,
    pub title: String,
    pub status: String,
    /// User name, or `unassigned`
    pub assigned_to: String,
}

/// Active run with its live progress.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardRun {
    pub run_id: Uuid,
    pub plan_name: Option<String>,
    pub release_version: String,
    pub started_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub progress: u32,
}
