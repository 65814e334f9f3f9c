//! Read-only aggregations over run results.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entity::run_case;
use crate::entity::test_case::{self, Entity as TestCase};
use crate::entity::test_run::{self as run, Entity as TestRun};
use crate::error::AppResult;
use crate::models::{DashboardRun, RunCaseStatus, RunStatus, RunSummary, RunTestRow, UserCount};
use crate::services::reporting;

use super::test_runs::{describe_runs, load_run_cases, require_run};
use super::users::user_names;
use super::{db_err, DbPool};

impl DbPool {
    /// Counts per status for one run, with every status present.
    pub async fn run_summary(&self, run_id: Uuid) -> AppResult<RunSummary> {
        require_run(self.connection(), run_id).await?;
        let cases = load_run_cases(self.connection(), run_id).await?;
        Ok(summarize_cases(&cases))
    }

    /// Case counts per assignee, largest first.
    pub async fn run_by_user(&self, run_id: Uuid) -> AppResult<Vec<UserCount>> {
        require_run(self.connection(), run_id).await?;
        let cases = load_run_cases(self.connection(), run_id).await?;
        let names =
            user_names(self.connection(), cases.iter().filter_map(|c| c.assigned_to)).await?;

        Ok(reporting::count_by_assignee(cases.iter().map(|c| c.assigned_to), &names))
    }

    /// Every case of a run with title, status and assignee, ordered by title.
    pub async fn run_test_list(&self, run_id: Uuid) -> AppResult<Vec<RunTestRow>> {
        require_run(self.connection(), run_id).await?;
        let cases = load_run_cases(self.connection(), run_id).await?;
        if cases.is_empty() {
            return Ok(Vec::new());
        }

        let titles: HashMap<Uuid, String> = TestCase::find()
            .filter(test_case::Column::Id.is_in(cases.iter().map(|c| c.test_case_id)))
            .all(self.connection())
            .await
            .map_err(db_err("load run test titles"))?
            .into_iter()
            .map(|c| (c.id, c.title))
            .collect();
        let names =
            user_names(self.connection(), cases.iter().filter_map(|c| c.assigned_to)).await?;

        let mut rows: Vec<RunTestRow> = cases
            .into_iter()
            .map(|c| RunTestRow {
                title: titles.get(&c.test_case_id).cloned().unwrap_or_default(),
                test_case_id: c.test_case_id,
                status: c.status,
                assigned_to: reporting::assignee_label(c.assigned_to, &names),
            })
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.test_case_id.cmp(&b.test_case_id)));
        Ok(rows)
    }

    /// Runs still in progress with their live progress, most recent first.
    pub async fn dashboard(&self) -> AppResult<Vec<DashboardRun>> {
        let runs = TestRun::find()
            .filter(run::Column::Status.eq(RunStatus::InProgress.as_str()))
            .order_by_desc(run::Column::StartedAt)
            .order_by_desc(run::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list active runs"))?;

        Ok(describe_runs(self.connection(), runs)
            .await?
            .into_iter()
            .map(|item| DashboardRun {
                run_id: item.run.id,
                plan_name: item.plan_name,
                release_version: item.release_version,
                started_at: item.run.started_at,
                summary: item.summary,
                progress: item.progress,
            })
            .collect())
    }
}

fn summarize_cases(cases: &[run_case::Model]) -> RunSummary {
    reporting::summarize(cases.iter().filter_map(|c| RunCaseStatus::parse(&c.status)))
}
