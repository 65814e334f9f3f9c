//! Test run models: run lifecycle, execution statuses and tree filters.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::RunSummary;
use crate::entity::{run_case, test_run};
use crate::error::{AppError, AppResult};

/// Lifecycle of a test run. A finished run never reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    InProgress,
    Finished,
}

impl RunStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN_PROGRESS" => Some(Self::InProgress),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution outcome of one case inside a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RunCaseStatus {
    #[serde(rename = "untested")]
    Untested,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
    #[serde(rename = "BLOCKED")]
    Blocked,
}

impl RunCaseStatus {
    /// Every status in reporting order.
    pub const ALL: [RunCaseStatus; 4] = [Self::Ok, Self::Nok, Self::Blocked, Self::Untested];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untested => "untested",
            Self::Ok => "OK",
            Self::Nok => "NOK",
            Self::Blocked => "BLOCKED",
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "untested" => Some(Self::Untested),
            "OK" => Some(Self::Ok),
            "NOK" => Some(Self::Nok),
            "BLOCKED" => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Parse a status recorded by a tester. `untested` is not a valid outcome.
    pub fn parse_outcome(s: &str) -> AppResult<Self> {
        match Self::parse(s) {
            Some(Self::Untested) => Err(AppError::InvalidInput(
                "status must be one of OK, NOK, BLOCKED".to_string(),
            )),
            Some(status) => Ok(status),
            None => Err(AppError::InvalidInput(format!(
                "unknown status '{}', expected OK, NOK or BLOCKED",
                s
            ))),
        }
    }

    /// Whether the case has been executed.
    pub fn is_executed(&self) -> bool {
        !matches!(self, Self::Untested)
    }
}

impl std::fmt::Display for RunCaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assignee filter for the run tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    Any,
    Unassigned,
    User(Uuid),
}

impl AssigneeFilter {
    /// Parse `unassigned`, a user id, or nothing/`all`.
    pub fn parse(s: Option<&str>) -> AppResult<Self> {
        match s.map(str::trim) {
            None | Some("") | Some("all") => Ok(Self::Any),
            Some("unassigned") => Ok(Self::Unassigned),
            Some(id) => Uuid::parse_str(id)
                .map(Self::User)
                .map_err(|_| AppError::InvalidInput(format!("invalid assigned_to '{}'", id))),
        }
    }

    pub fn matches(&self, assigned_to: Option<Uuid>) -> bool {
        match self {
            Self::Any => true,
            Self::Unassigned => assigned_to.is_none(),
            Self::User(id) => assigned_to == Some(*id),
        }
    }
}

/// Query string accepted by the run tree endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RunTreeQuery {
    /// `unassigned` or a user id
    pub assigned_to: Option<String>,
    /// Comma-separated statuses, e.g. `NOK,BLOCKED`
    pub statuses: Option<String>,
}

/// Parsed run tree filter. Filters only drop case leaves, never groups.
#[derive(Debug, Clone, Default)]
pub struct RunTreeFilter {
    pub assignee: AssigneeFilter,
    /// `None` keeps every status
    pub statuses: Option<HashSet<RunCaseStatus>>,
}

impl RunTreeFilter {
    pub fn from_query(query: &RunTreeQuery) -> AppResult<Self> {
        let assignee = AssigneeFilter::parse(query.assigned_to.as_deref())?;

        let statuses = match query.statuses.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(csv) => {
                let mut set = HashSet::new();
                for raw in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let status = RunCaseStatus::parse(raw).ok_or_else(|| {
                        AppError::InvalidInput(format!("unknown status '{}'", raw))
                    })?;
                    set.insert(status);
                }
                Some(set)
            }
        };

        Ok(Self { assignee, statuses })
    }

    pub fn matches(&self, status: RunCaseStatus, assigned_to: Option<Uuid>) -> bool {
        let status_ok = self
            .statuses
            .as_ref()
            .is_none_or(|set| set.contains(&status));
        status_ok && self.assignee.matches(assigned_to)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddRunUserRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTestsRequest {
    pub user_id: Uuid,
    pub test_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnassignTestsRequest {
    pub test_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FinishTestCaseRequest {
    pub test_case_id: Uuid,
    /// OK, NOK or BLOCKED
    pub status: String,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunResponse {
    pub id: Uuid,
    pub plan_id: Option<Uuid>,
    pub release_id: Uuid,
    pub status: String,
    pub started_by: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<test_run::Model> for RunResponse {
    fn from(r: test_run::Model) -> Self {
        Self {
            id: r.id,
            plan_id: r.plan_id,
            release_id: r.release_id,
            status: r.status,
            started_by: r.started_by,
            started_at: r.started_at,
            finished_at: r.finished_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartRunResponse {
    pub run: RunResponse,
    /// Number of cases snapshotted from the plan
    pub case_count: u64,
}

/// Run with the names of its plan and release and its completion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunListItem {
    pub run: RunResponse,
    /// `None` once the source plan has been deleted
    pub plan_name: Option<String>,
    pub release_version: String,
    pub summary: RunSummary,
    /// Rounded percentage of executed cases
    pub progress: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunCaseResponse {
    pub id: Uuid,
    pub run_id: Uuid,
    pub test_case_id: Uuid,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub comment: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl From<run_case::Model> for RunCaseResponse {
    fn from(c: run_case::Model) -> Self {
        Self {
            id: c.id,
            run_id: c.run_id,
            test_case_id: c.test_case_id,
            status: c.status,
            assigned_to: c.assigned_to,
            comment: c.comment,
            executed_at: c.executed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_uses_upper_case_names() {
        assert_eq!(RunStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(RunStatus::parse("FINISHED"), Some(RunStatus::Finished));
        assert_eq!(RunStatus::parse("finished"), None);
        assert_eq!(
            serde_json::to_value(RunStatus::InProgress).unwrap(),
            serde_json::json!("IN_PROGRESS")
        );
    }

    #[test]
    fn test_parse_outcome_rejects_untested_and_unknown() {
        assert_eq!(RunCaseStatus::parse_outcome("OK").ok(), Some(RunCaseStatus::Ok));
        assert_eq!(
            RunCaseStatus::parse_outcome("BLOCKED").ok(),
            Some(RunCaseStatus::Blocked)
        );
        assert!(matches!(
            RunCaseStatus::parse_outcome("untested"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            RunCaseStatus::parse_outcome("ok"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_assignee_filter_parse() {
        let id = Uuid::now_v7();
        assert_eq!(AssigneeFilter::parse(None).ok(), Some(AssigneeFilter::Any));
        assert_eq!(
            AssigneeFilter::parse(Some("unassigned")).ok(),
            Some(AssigneeFilter::Unassigned)
        );
        assert_eq!(
            AssigneeFilter::parse(Some(&id.to_string())).ok(),
            Some(AssigneeFilter::User(id))
        );
        assert!(AssigneeFilter::parse(Some("bob")).is_err());
    }

    #[test]
    fn test_filter_from_query() {
        let query = RunTreeQuery {
            assigned_to: Some("unassigned".to_string()),
            statuses: Some("NOK, BLOCKED".to_string()),
        };
        let filter = RunTreeFilter::from_query(&query).unwrap();

        assert!(filter.matches(RunCaseStatus::Nok, None));
        assert!(filter.matches(RunCaseStatus::Blocked, None));
        assert!(!filter.matches(RunCaseStatus::Ok, None));
        assert!(!filter.matches(RunCaseStatus::Nok, Some(Uuid::now_v7())));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = RunTreeFilter::from_query(&RunTreeQuery::default()).unwrap();
        for status in RunCaseStatus::ALL {
            assert!(filter.matches(status, None));
            assert!(filter.matches(status, Some(Uuid::now_v7())));
        }
    }

    #[test]
    fn test_filter_rejects_unknown_status() {
        let query = RunTreeQuery {
            assigned_to: None,
            statuses: Some("OK,PASSED".to_string()),
        };
        assert!(RunTreeFilter::from_query(&query).is_err());
    }
}
