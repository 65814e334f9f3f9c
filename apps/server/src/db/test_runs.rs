//! Database queries for test runs: snapshot, assignment and execution.
//!
//! A run copies the case list of its plan when it starts and is independent
//! of later plan edits. Writes to a run lock the run row and are refused once
//! the run is finished.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::release::{self, Entity as Release};
use crate::entity::release_plan::{self, Entity as ReleasePlan};
use crate::entity::run_case::{self, Entity as RunCase};
use crate::entity::run_user::{self, Entity as RunUser};
use crate::entity::test_case::{self, Entity as TestCase};
use crate::entity::test_group::{self as group, Entity as TestGroup};
use crate::entity::test_plan::{self as plan, Entity as TestPlan};
use crate::entity::test_run::{self as run, ActiveModel, Entity as TestRun};
use crate::entity::user::{self, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::{RunCaseStatus, RunListItem, RunStatus, RunTreeFilter, TreeRow};
use crate::services::reporting;

use super::releases::require_release;
use super::test_plans::{load_order, unique_violation_or};
use super::users::{require_user, user_names};
use super::{db_err, finalize_transaction, DbPool};

impl DbPool {
    /// Start a run of `plan_id` for `release_id`.
    ///
    /// Every case of the plan is copied as `untested` in the same
    /// transaction. Returns the run and the number of copied cases.
    pub async fn start_run(
        &self,
        release_id: Uuid,
        plan_id: Uuid,
        started_by: Option<Uuid>,
    ) -> AppResult<(run::Model, u64)> {
        let txn = self.begin().await?;

        let result: AppResult<(run::Model, u64)> = async {
            require_release(&txn, release_id).await?;
            TestPlan::find_by_id(plan_id)
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err("lock test plan"))?
                .ok_or_else(|| AppError::NotFound(format!("Test plan {}", plan_id)))?;

            let linked = ReleasePlan::find()
                .filter(release_plan::Column::ReleaseId.eq(release_id))
                .filter(release_plan::Column::PlanId.eq(plan_id))
                .one(&txn)
                .await
                .map_err(db_err("check release plan link"))?;
            if linked.is_none() {
                return Err(AppError::InvalidInput(format!(
                    "plan {} is not linked to release {}",
                    plan_id, release_id
                )));
            }

            let now = Utc::now();
            let run = ActiveModel {
                id: Set(Uuid::now_v7()),
                plan_id: Set(Some(plan_id)),
                release_id: Set(release_id),
                status: Set(RunStatus::InProgress.as_str().to_string()),
                started_by: Set(started_by),
                started_at: Set(now),
                finished_at: Set(None),
            }
            .insert(&txn)
            .await
            .map_err(db_err("insert test run"))?;

            let entries = load_order(&txn, plan_id).await?;
            let count = entries.len() as u64;
            if !entries.is_empty() {
                let cases = entries.into_iter().map(|entry| run_case::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    run_id: Set(run.id),
                    test_case_id: Set(entry.test_case_id),
                    status: Set(RunCaseStatus::Untested.as_str().to_string()),
                    assigned_to: Set(None),
                    comment: Set(None),
                    executed_at: Set(None),
                    updated_at: Set(now),
                });
                RunCase::insert_many(cases)
                    .exec(&txn)
                    .await
                    .map_err(db_err("snapshot plan cases"))?;
            }

            Ok((run, count))
        }
        .await;

        let (run, count) = finalize_transaction(txn, result).await?;
        info!(
            "Started test run {} of plan {} for release {} with {} cases",
            run.id, plan_id, release_id, count
        );
        Ok((run, count))
    }

    /// Get a run by ID.
    pub async fn get_run_by_id(&self, id: Uuid) -> AppResult<Option<run::Model>> {
        TestRun::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get test run"))
    }

    /// A run with plan name, release version and progress.
    pub async fn get_run_detail(&self, id: Uuid) -> AppResult<RunListItem> {
        let run = require_run(self.connection(), id).await?;
        let mut items = describe_runs(self.connection(), vec![run]).await?;
        items
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Test run {}", id)))
    }

    /// All runs, most recently started first.
    pub async fn list_runs(&self) -> AppResult<Vec<RunListItem>> {
        let runs = TestRun::find()
            .order_by_desc(run::Column::StartedAt)
            .order_by_desc(run::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list test runs"))?;

        describe_runs(self.connection(), runs).await
    }

    /// Runs a user participates in, most recently started first.
    pub async fn list_runs_for_user(&self, user_id: Uuid) -> AppResult<Vec<RunListItem>> {
        let run_ids: Vec<Uuid> = RunUser::find()
            .filter(run_user::Column::UserId.eq(user_id))
            .all(self.connection())
            .await
            .map_err(db_err("list run memberships"))?
            .into_iter()
            .map(|m| m.run_id)
            .collect();
        if run_ids.is_empty() {
            return Ok(Vec::new());
        }

        let runs = TestRun::find()
            .filter(run::Column::Id.is_in(run_ids))
            .order_by_desc(run::Column::StartedAt)
            .order_by_desc(run::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list test runs for user"))?;

        describe_runs(self.connection(), runs).await
    }

    /// Add a participant to a run.
    pub async fn add_user_to_run(&self, run_id: Uuid, user_id: Uuid) -> AppResult<run_user::Model> {
        require_run(self.connection(), run_id).await?;
        require_user(self.connection(), user_id).await?;

        let existing = RunUser::find()
            .filter(run_user::Column::RunId.eq(run_id))
            .filter(run_user::Column::UserId.eq(user_id))
            .one(self.connection())
            .await
            .map_err(db_err("check run membership"))?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "user {} already participates in run {}",
                user_id, run_id
            )));
        }

        let membership = run_user::ActiveModel {
            id: Set(Uuid::now_v7()),
            run_id: Set(run_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        }
        .insert(self.connection())
        .await
        .map_err(|e| {
            unique_violation_or(e, || {
                format!("user {} already participates in run {}", user_id, run_id)
            })
        })?;

        info!("Added user {} to test run {}", user_id, run_id);
        Ok(membership)
    }

    /// Participants of a run.
    pub async fn list_run_users(&self, run_id: Uuid) -> AppResult<Vec<user::Model>> {
        require_run(self.connection(), run_id).await?;

        let user_ids: Vec<Uuid> = RunUser::find()
            .filter(run_user::Column::RunId.eq(run_id))
            .order_by_asc(run_user::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list run users"))?
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .order_by_asc(user::Column::Name)
            .all(self.connection())
            .await
            .map_err(db_err("list run users"))
    }

    /// Mark a run finished. Finishing twice is a conflict.
    pub async fn finish_run(&self, id: Uuid) -> AppResult<run::Model> {
        let updated = TestRun::update_many()
            .col_expr(run::Column::Status, Expr::value(RunStatus::Finished.as_str()))
            .col_expr(run::Column::FinishedAt, Expr::value(Utc::now()))
            .filter(run::Column::Id.eq(id))
            .filter(run::Column::Status.eq(RunStatus::InProgress.as_str()))
            .exec(self.connection())
            .await
            .map_err(db_err("finish test run"))?;

        if updated.rows_affected == 0 {
            require_run(self.connection(), id).await?;
            return Err(AppError::Conflict(format!("test run {} is already finished", id)));
        }

        info!("Finished test run {}", id);
        require_run(self.connection(), id).await
    }

    /// Run cases in snapshot order.
    pub async fn get_run_cases(&self, run_id: Uuid) -> AppResult<Vec<run_case::Model>> {
        require_run(self.connection(), run_id).await?;
        load_run_cases(self.connection(), run_id).await
    }

    /// Assign `user_id` to the listed cases of a run.
    ///
    /// Every id must be part of the run, otherwise nothing is updated.
    pub async fn assign_tests(
        &self,
        run_id: Uuid,
        user_id: Uuid,
        test_case_ids: &[Uuid],
    ) -> AppResult<Vec<run_case::Model>> {
        let txn = self.begin().await?;

        let result: AppResult<Vec<run_case::Model>> = async {
            lock_open_run(&txn, run_id).await?;
            require_user(&txn, user_id).await?;
            let cases = select_run_cases(&txn, run_id, test_case_ids).await?;

            let member = RunUser::find()
                .filter(run_user::Column::RunId.eq(run_id))
                .filter(run_user::Column::UserId.eq(user_id))
                .one(&txn)
                .await
                .map_err(db_err("check run membership"))?;
            if member.is_none() {
                run_user::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    run_id: Set(run_id),
                    user_id: Set(user_id),
                    created_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await
                .map_err(db_err("add run user"))?;
            }

            set_assignee(&txn, cases, Some(user_id)).await
        }
        .await;

        let updated = finalize_transaction(txn, result).await?;
        info!(
            "Assigned {} cases of test run {} to user {}",
            updated.len(),
            run_id,
            user_id
        );
        Ok(updated)
    }

    /// Clear the assignee of the listed cases of a run.
    pub async fn unassign_tests(
        &self,
        run_id: Uuid,
        test_case_ids: &[Uuid],
    ) -> AppResult<Vec<run_case::Model>> {
        let txn = self.begin().await?;

        let result: AppResult<Vec<run_case::Model>> = async {
            lock_open_run(&txn, run_id).await?;
            let cases = select_run_cases(&txn, run_id, test_case_ids).await?;
            set_assignee(&txn, cases, None).await
        }
        .await;

        let updated = finalize_transaction(txn, result).await?;
        info!("Unassigned {} cases of test run {}", updated.len(), run_id);
        Ok(updated)
    }

    /// Record the outcome of one case in a run.
    pub async fn finish_test_case(
        &self,
        run_id: Uuid,
        test_case_id: Uuid,
        status: RunCaseStatus,
        comment: Option<String>,
    ) -> AppResult<run_case::Model> {
        if !status.is_executed() {
            return Err(AppError::InvalidInput(
                "status must be one of OK, NOK, BLOCKED".to_string(),
            ));
        }

        let txn = self.begin().await?;

        let result: AppResult<run_case::Model> = async {
            lock_open_run(&txn, run_id).await?;
            let mut cases = select_run_cases(&txn, run_id, &[test_case_id]).await?;
            let case = cases.pop().ok_or_else(|| {
                AppError::NotFound(format!("Test case {} in run {}", test_case_id, run_id))
            })?;

            let now = Utc::now();
            let mut active: run_case::ActiveModel = case.into();
            active.status = Set(status.as_str().to_string());
            active.comment = Set(comment);
            active.executed_at = Set(Some(now));
            active.updated_at = Set(now);

            active.update(&txn).await.map_err(db_err("record test result"))
        }
        .await;

        let updated = finalize_transaction(txn, result).await?;
        info!(
            "Recorded {} for test case {} in run {}",
            status, test_case_id, run_id
        );
        Ok(updated)
    }

    /// Flat tree rows for a run.
    ///
    /// Every group holding a run case, and each of its ancestors, yields at
    /// least one row. The filter only decides which case leaves are emitted.
    pub async fn run_tree_rows(
        &self,
        run_id: Uuid,
        filter: &RunTreeFilter,
    ) -> AppResult<Vec<TreeRow>> {
        let run = require_run(self.connection(), run_id).await?;
        let release = Release::find_by_id(run.release_id)
            .one(self.connection())
            .await
            .map_err(db_err("get run release"))?
            .ok_or_else(|| AppError::NotFound(format!("Release {}", run.release_id)))?;

        let run_cases = load_run_cases(self.connection(), run_id).await?;
        let case_ids: Vec<Uuid> = run_cases.iter().map(|c| c.test_case_id).collect();
        let cases: HashMap<Uuid, test_case::Model> = if case_ids.is_empty() {
            HashMap::new()
        } else {
            TestCase::find()
                .filter(test_case::Column::Id.is_in(case_ids))
                .all(self.connection())
                .await
                .map_err(db_err("load run test cases"))?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let groups = TestGroup::find()
            .filter(group::Column::ProjectId.eq(release.project_id))
            .order_by_asc(group::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("load groups for run tree"))?;
        let parents: HashMap<Uuid, Option<Uuid>> =
            groups.iter().map(|g| (g.id, g.parent_id)).collect();

        // Groups that hold a run case, plus all of their ancestors.
        let mut visible: HashSet<Uuid> = HashSet::new();
        for case in cases.values() {
            let mut current = Some(case.group_id);
            while let Some(group_id) = current {
                if !visible.insert(group_id) {
                    break;
                }
                current = parents.get(&group_id).copied().flatten();
            }
        }

        let names = user_names(
            self.connection(),
            run_cases.iter().filter_map(|c| c.assigned_to),
        )
        .await?;

        let mut leaves: HashMap<Uuid, Vec<TreeRow>> = HashMap::new();
        for rc in &run_cases {
            let Some(case) = cases.get(&rc.test_case_id) else {
                continue;
            };
            let status = RunCaseStatus::parse(&rc.status).unwrap_or(RunCaseStatus::Untested);
            if !filter.matches(status, rc.assigned_to) {
                continue;
            }
            leaves.entry(case.group_id).or_default().push(TreeRow {
                group_id: case.group_id,
                group_name: String::new(),
                parent_group_id: None,
                case_id: Some(case.id),
                case_title: Some(case.title.clone()),
                case_status: Some(rc.status.clone()),
                assigned_to: rc.assigned_to,
                assigned_to_name: rc.assigned_to.and_then(|id| names.get(&id).cloned()),
            });
        }

        let mut rows = Vec::new();
        for group in groups.into_iter().filter(|g| visible.contains(&g.id)) {
            match leaves.remove(&group.id) {
                None => rows.push(TreeRow::group_only(group.id, group.name, group.parent_id)),
                Some(group_leaves) => {
                    for leaf in group_leaves {
                        rows.push(TreeRow {
                            group_name: group.name.clone(),
                            parent_group_id: group.parent_id,
                            ..leaf
                        });
                    }
                }
            }
        }

        Ok(rows)
    }
}

/// Fetch a run or fail with NotFound.
pub(crate) async fn require_run<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<run::Model> {
    TestRun::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err("get test run"))?
        .ok_or_else(|| AppError::NotFound(format!("Test run {}", id)))
}

/// Lock a run for the rest of the transaction; it must still be in progress.
async fn lock_open_run(txn: &DatabaseTransaction, id: Uuid) -> AppResult<run::Model> {
    let run = TestRun::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err("lock test run"))?
        .ok_or_else(|| AppError::NotFound(format!("Test run {}", id)))?;

    if RunStatus::parse(&run.status) == Some(RunStatus::Finished) {
        return Err(AppError::Conflict(format!("test run {} is finished", id)));
    }
    Ok(run)
}

pub(crate) async fn load_run_cases<C: ConnectionTrait>(
    conn: &C,
    run_id: Uuid,
) -> AppResult<Vec<run_case::Model>> {
    RunCase::find()
        .filter(run_case::Column::RunId.eq(run_id))
        .order_by_asc(run_case::Column::Id)
        .all(conn)
        .await
        .map_err(db_err("load run cases"))
}

/// Refuse with Conflict when any of the cases was captured by a run.
///
/// Run snapshots outlive the library, so a case with run history stays.
pub(crate) async fn ensure_no_run_history<C: ConnectionTrait>(
    conn: &C,
    test_case_ids: &[Uuid],
) -> AppResult<()> {
    if test_case_ids.is_empty() {
        return Ok(());
    }

    let captured = RunCase::find()
        .filter(run_case::Column::TestCaseId.is_in(test_case_ids.iter().copied()))
        .order_by_asc(run_case::Column::Id)
        .one(conn)
        .await
        .map_err(db_err("check run history"))?;

    match captured {
        None => Ok(()),
        Some(entry) => Err(AppError::Conflict(format!(
            "test case {} is part of test run {}",
            entry.test_case_id, entry.run_id
        ))),
    }
}

/// Run cases for the given test case ids. Fails if any id is not in the run.
async fn select_run_cases(
    txn: &DatabaseTransaction,
    run_id: Uuid,
    test_case_ids: &[Uuid],
) -> AppResult<Vec<run_case::Model>> {
    if test_case_ids.is_empty() {
        return Err(AppError::InvalidInput("test_ids cannot be empty".to_string()));
    }

    let wanted: HashSet<Uuid> = test_case_ids.iter().copied().collect();
    let found = RunCase::find()
        .filter(run_case::Column::RunId.eq(run_id))
        .filter(run_case::Column::TestCaseId.is_in(wanted.iter().copied()))
        .order_by_asc(run_case::Column::Id)
        .all(txn)
        .await
        .map_err(db_err("select run cases"))?;

    let present: HashSet<Uuid> = found.iter().map(|c| c.test_case_id).collect();
    let mut missing: Vec<String> = wanted
        .difference(&present)
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(AppError::NotFound(format!(
            "Test cases [{}] in run {}",
            missing.join(", "),
            run_id
        )));
    }

    Ok(found)
}

async fn set_assignee(
    txn: &DatabaseTransaction,
    cases: Vec<run_case::Model>,
    assignee: Option<Uuid>,
) -> AppResult<Vec<run_case::Model>> {
    let now = Utc::now();
    let mut updated = Vec::with_capacity(cases.len());
    for case in cases {
        let mut active: run_case::ActiveModel = case.into();
        active.assigned_to = Set(assignee);
        active.updated_at = Set(now);
        updated.push(active.update(txn).await.map_err(db_err("update assignee"))?);
    }
    Ok(updated)
}

/// Attach plan name, release version and progress to runs, keeping their order.
pub(crate) async fn describe_runs<C: ConnectionTrait>(
    conn: &C,
    runs: Vec<run::Model>,
) -> AppResult<Vec<RunListItem>> {
    if runs.is_empty() {
        return Ok(Vec::new());
    }

    let plan_ids: Vec<Uuid> = runs.iter().filter_map(|r| r.plan_id).collect();
    let plan_names: HashMap<Uuid, String> = if plan_ids.is_empty() {
        HashMap::new()
    } else {
        TestPlan::find()
            .filter(plan::Column::Id.is_in(plan_ids))
            .all(conn)
            .await
            .map_err(db_err("load run plans"))?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect()
    };

    let release_ids: Vec<Uuid> = runs.iter().map(|r| r.release_id).collect();
    let versions: HashMap<Uuid, String> = Release::find()
        .filter(release::Column::Id.is_in(release_ids))
        .all(conn)
        .await
        .map_err(db_err("load run releases"))?
        .into_iter()
        .map(|r| (r.id, r.version))
        .collect();

    let run_ids: Vec<Uuid> = runs.iter().map(|r| r.id).collect();
    let mut statuses: HashMap<Uuid, Vec<RunCaseStatus>> = HashMap::new();
    let cases = RunCase::find()
        .filter(run_case::Column::RunId.is_in(run_ids))
        .select_only()
        .column(run_case::Column::RunId)
        .column(run_case::Column::Status)
        .into_tuple::<(Uuid, String)>()
        .all(conn)
        .await
        .map_err(db_err("load run statuses"))?;
    for (run_id, status) in cases {
        if let Some(status) = RunCaseStatus::parse(&status) {
            statuses.entry(run_id).or_default().push(status);
        }
    }

    Ok(runs
        .into_iter()
        .map(|run| {
            let summary = reporting::summarize(statuses.remove(&run.id).unwrap_or_default());
            RunListItem {
                plan_name: run.plan_id.and_then(|id| plan_names.get(&id).cloned()),
                release_version: versions.get(&run.release_id).cloned().unwrap_or_default(),
                progress: reporting::completion_percentage(&summary),
                summary,
                run: run.into(),
            }
        })
        .collect())
}
