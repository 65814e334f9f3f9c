//! Database queries for test plans and their ordered case lists.
//!
//! Every mutation of a plan's case list locks the plan row first so that
//! concurrent edits of the same plan serialize and positions stay dense.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::plan_case::{self, Entity as PlanCase};
use crate::entity::release::{self, Entity as Release};
use crate::entity::release_plan::{self, Entity as ReleasePlan};
use crate::entity::test_case::Entity as TestCase;
use crate::entity::test_group::{self as group, Entity as TestGroup};
use crate::entity::test_plan::{self as plan, ActiveModel, Entity as TestPlan};
use crate::error::{ensure_non_empty, AppError, AppResult};
use crate::models::PlanCaseView;
use crate::services::ordering;

use super::releases::require_release;
use super::test_cases::require_test_case;
use super::{db_err, finalize_transaction, DbPool};

/// Suffix appended to the name of a cloned plan.
pub const CLONE_SUFFIX: &str = " (Copy)";

impl DbPool {
    /// Create a plan and link it to `release_id` in one transaction.
    pub async fn create_plan_in_release(
        &self,
        release_id: Uuid,
        name: &str,
        description: &str,
        created_by: Option<Uuid>,
    ) -> AppResult<plan::Model> {
        ensure_non_empty("name", name)?;
        let txn = self.begin().await?;

        let result: AppResult<plan::Model> = async {
            let release = require_release(&txn, release_id).await?;
            let plan = insert_plan(
                &txn,
                release.project_id,
                name.trim(),
                description,
                created_by,
            )
            .await?;
            link_plan(&txn, release.id, plan.id).await?;
            Ok(plan)
        }
        .await;

        let plan = finalize_transaction(txn, result).await?;
        info!("Created test plan {} in release {}", plan.id, release_id);
        Ok(plan)
    }

    /// Plans linked to a release, oldest first.
    pub async fn list_plans_for_release(&self, release_id: Uuid) -> AppResult<Vec<plan::Model>> {
        require_release(self.connection(), release_id).await?;

        TestPlan::find()
            .inner_join(ReleasePlan)
            .filter(release_plan::Column::ReleaseId.eq(release_id))
            .order_by_asc(plan::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list plans for release"))
    }

    /// Every plan/release link of a project, newest release first.
    pub async fn list_plans_for_project(
        &self,
        project_id: Uuid,
    ) -> AppResult<Vec<(plan::Model, release::Model)>> {
        let releases = Release::find()
            .filter(release::Column::ProjectId.eq(project_id))
            .order_by_desc(release::Column::CreatedAt)
            .order_by_desc(release::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list releases"))?;
        if releases.is_empty() {
            return Ok(Vec::new());
        }

        let release_ids: Vec<Uuid> = releases.iter().map(|r| r.id).collect();
        let links = ReleasePlan::find()
            .filter(release_plan::Column::ReleaseId.is_in(release_ids))
            .order_by_asc(release_plan::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list release plans"))?;

        let plan_ids: Vec<Uuid> = links.iter().map(|l| l.plan_id).collect();
        let plans: HashMap<Uuid, plan::Model> = if plan_ids.is_empty() {
            HashMap::new()
        } else {
            TestPlan::find()
                .filter(plan::Column::Id.is_in(plan_ids))
                .all(self.connection())
                .await
                .map_err(db_err("list plans"))?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let mut out = Vec::new();
        for release in releases {
            for link in links.iter().filter(|l| l.release_id == release.id) {
                if let Some(plan) = plans.get(&link.plan_id) {
                    out.push((plan.clone(), release.clone()));
                }
            }
        }
        Ok(out)
    }

    /// Get a plan by ID.
    pub async fn get_plan_by_id(&self, id: Uuid) -> AppResult<Option<plan::Model>> {
        TestPlan::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get test plan"))
    }

    /// Ordered cases of a plan joined with title, status and group.
    pub async fn get_plan_cases(&self, plan_id: Uuid) -> AppResult<Vec<PlanCaseView>> {
        let rows = PlanCase::find()
            .filter(plan_case::Column::PlanId.eq(plan_id))
            .order_by_asc(plan_case::Column::Position)
            .find_also_related(TestCase)
            .all(self.connection())
            .await
            .map_err(db_err("get plan cases"))?;

        let group_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|(_, case)| case.as_ref().map(|c| c.group_id))
            .collect();
        let group_names: HashMap<Uuid, String> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            TestGroup::find()
                .filter(group::Column::Id.is_in(group_ids))
                .all(self.connection())
                .await
                .map_err(db_err("get plan case groups"))?
                .into_iter()
                .map(|g| (g.id, g.name))
                .collect()
        };

        Ok(rows
            .into_iter()
            .filter_map(|(entry, case)| {
                let case = case?;
                Some(PlanCaseView {
                    test_case_id: entry.test_case_id,
                    position: entry.position,
                    group_name: group_names.get(&case.group_id).cloned(),
                    group_id: case.group_id,
                    title: case.title,
                    status: case.status,
                })
            })
            .collect())
    }

    pub async fn rename_plan(&self, id: Uuid, name: &str) -> AppResult<plan::Model> {
        ensure_non_empty("name", name)?;

        let plan = self
            .get_plan_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test plan {}", id)))?;

        let mut active: ActiveModel = plan.into();
        active.name = Set(name.trim().to_string());
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(db_err("rename test plan"))
    }

    /// Delete a plan: links, then entries, then the plan. Runs keep their
    /// snapshot and lose the plan reference.
    pub async fn delete_plan(&self, id: Uuid) -> AppResult<plan::Model> {
        let txn = self.begin().await?;

        let result: AppResult<plan::Model> = async {
            let plan = lock_plan(&txn, id).await?;

            ReleasePlan::delete_many()
                .filter(release_plan::Column::PlanId.eq(id))
                .exec(&txn)
                .await
                .map_err(db_err("unlink test plan"))?;

            PlanCase::delete_many()
                .filter(plan_case::Column::PlanId.eq(id))
                .exec(&txn)
                .await
                .map_err(db_err("delete plan cases"))?;

            TestPlan::delete_by_id(id)
                .exec(&txn)
                .await
                .map_err(db_err("delete test plan"))?;

            Ok(plan)
        }
        .await;

        let plan = finalize_transaction(txn, result).await?;
        info!("Deleted test plan {}", plan.id);
        Ok(plan)
    }

    /// Copy a plan and its ordered cases into `release_id`.
    ///
    /// The copy is named after the source with [`CLONE_SUFFIX`] and is fully
    /// independent of it. Returns the new plan and the copied case ids in order.
    pub async fn clone_plan(
        &self,
        source_id: Uuid,
        release_id: Uuid,
        created_by: Option<Uuid>,
    ) -> AppResult<(plan::Model, Vec<Uuid>)> {
        let txn = self.begin().await?;

        let result: AppResult<(plan::Model, Vec<Uuid>)> = async {
            let source = lock_plan(&txn, source_id).await?;
            let release = require_release(&txn, release_id).await?;
            if release.project_id != source.project_id {
                return Err(AppError::InvalidInput(
                    "cannot clone a plan into a release of another project".to_string(),
                ));
            }

            let name = format!("{}{}", source.name, CLONE_SUFFIX);
            let copy = insert_plan(
                &txn,
                source.project_id,
                &name,
                &source.description,
                created_by,
            )
            .await?;
            link_plan(&txn, release.id, copy.id).await?;

            let case_ids: Vec<Uuid> = load_order(&txn, source.id)
                .await?
                .into_iter()
                .map(|entry| entry.test_case_id)
                .collect();

            if !case_ids.is_empty() {
                let now = Utc::now();
                let entries = case_ids.iter().enumerate().map(|(idx, case_id)| {
                    plan_case::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        plan_id: Set(copy.id),
                        test_case_id: Set(*case_id),
                        position: Set(idx as i32 + 1),
                        created_at: Set(now),
                    }
                });
                PlanCase::insert_many(entries)
                    .exec(&txn)
                    .await
                    .map_err(db_err("copy plan cases"))?;
            }

            Ok((copy, case_ids))
        }
        .await;

        let (copy, case_ids) = finalize_transaction(txn, result).await?;
        info!(
            "Cloned test plan {} into {} ({} cases)",
            source_id,
            copy.id,
            case_ids.len()
        );
        Ok((copy, case_ids))
    }

    /// Append a test case to the end of a plan.
    pub async fn add_case_to_plan(
        &self,
        plan_id: Uuid,
        test_case_id: Uuid,
    ) -> AppResult<plan_case::Model> {
        let txn = self.begin().await?;

        let result: AppResult<plan_case::Model> = async {
            let plan = lock_plan(&txn, plan_id).await?;
            let case = require_test_case(&txn, test_case_id).await?;
            if case.project_id != plan.project_id {
                return Err(AppError::InvalidInput(
                    "test case belongs to another project".to_string(),
                ));
            }

            let entries = load_order(&txn, plan_id).await?;
            if entries.iter().any(|e| e.test_case_id == test_case_id) {
                return Err(AppError::Conflict(format!(
                    "test case {} is already in plan {}",
                    test_case_id, plan_id
                )));
            }
            let next = entries.iter().map(|e| e.position).max().unwrap_or(0) + 1;

            let model = plan_case::ActiveModel {
                id: Set(Uuid::now_v7()),
                plan_id: Set(plan_id),
                test_case_id: Set(test_case_id),
                position: Set(next),
                created_at: Set(Utc::now()),
            };
            model.insert(&txn).await.map_err(|e| {
                unique_violation_or(e, || {
                    format!("test case {} is already in plan {}", test_case_id, plan_id)
                })
            })
        }
        .await;

        let entry = finalize_transaction(txn, result).await?;
        info!(
            "Added test case {} to plan {} at position {}",
            test_case_id, plan_id, entry.position
        );
        Ok(entry)
    }

    /// Remove a test case from a plan and shift later entries up by one.
    pub async fn remove_case_from_plan(&self, plan_id: Uuid, test_case_id: Uuid) -> AppResult<()> {
        let txn = self.begin().await?;

        let result: AppResult<i32> = async {
            lock_plan(&txn, plan_id).await?;
            let entries = load_order(&txn, plan_id).await?;

            let removed = entries
                .iter()
                .find(|e| e.test_case_id == test_case_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::NotFound(format!("Test case {} in plan {}", test_case_id, plan_id))
                })?;

            PlanCase::delete_by_id(removed.id)
                .exec(&txn)
                .await
                .map_err(db_err("remove plan case"))?;

            let current: Vec<(Uuid, i32)> = entries.iter().map(|e| (e.id, e.position)).collect();
            let order: Vec<Uuid> = entries
                .iter()
                .filter(|e| e.id != removed.id)
                .map(|e| e.id)
                .collect();
            write_positions(&txn, &ordering::position_changes(&current, &order)).await?;

            Ok(removed.position)
        }
        .await;

        let position = finalize_transaction(txn, result).await?;
        info!(
            "Removed test case {} from plan {} (was position {})",
            test_case_id, plan_id, position
        );
        Ok(())
    }

    /// Move a case within a plan to a 1-based position.
    pub async fn move_case_in_plan(
        &self,
        plan_id: Uuid,
        test_case_id: Uuid,
        position: i32,
    ) -> AppResult<Vec<PlanCaseView>> {
        let txn = self.begin().await?;

        let result: AppResult<()> = async {
            lock_plan(&txn, plan_id).await?;
            let entries = load_order(&txn, plan_id).await?;

            let moving = entries
                .iter()
                .find(|e| e.test_case_id == test_case_id)
                .map(|e| e.id)
                .ok_or_else(|| {
                    AppError::NotFound(format!("Test case {} in plan {}", test_case_id, plan_id))
                })?;

            let current: Vec<(Uuid, i32)> = entries.iter().map(|e| (e.id, e.position)).collect();
            let mut order: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
            ordering::move_to(&mut order, moving, position)?;
            write_positions(&txn, &ordering::position_changes(&current, &order)).await
        }
        .await;

        finalize_transaction(txn, result).await?;
        self.get_plan_cases(plan_id).await
    }
}

async fn insert_plan<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    name: &str,
    description: &str,
    created_by: Option<Uuid>,
) -> AppResult<plan::Model> {
    let now = Utc::now();
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        project_id: Set(project_id),
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model.insert(conn).await.map_err(db_err("insert test plan"))
}

async fn link_plan<C: ConnectionTrait>(
    conn: &C,
    release_id: Uuid,
    plan_id: Uuid,
) -> AppResult<release_plan::Model> {
    let model = release_plan::ActiveModel {
        id: Set(Uuid::now_v7()),
        release_id: Set(release_id),
        plan_id: Set(plan_id),
        created_at: Set(Utc::now()),
    };

    model.insert(conn).await.map_err(|e| {
        unique_violation_or(e, || {
            format!("plan {} is already linked to release {}", plan_id, release_id)
        })
    })
}

/// Lock a plan row for the rest of the transaction, or fail with NotFound.
async fn lock_plan(txn: &DatabaseTransaction, plan_id: Uuid) -> AppResult<plan::Model> {
    TestPlan::find_by_id(plan_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err("lock test plan"))?
        .ok_or_else(|| AppError::NotFound(format!("Test plan {}", plan_id)))
}

/// Remove the given cases from every plan holding them and renumber the
/// remaining entries of each affected plan. Returns the affected plan ids.
pub(crate) async fn detach_cases_from_plans(
    txn: &DatabaseTransaction,
    test_case_ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    if test_case_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut plan_ids: Vec<Uuid> = PlanCase::find()
        .filter(plan_case::Column::TestCaseId.is_in(test_case_ids.iter().copied()))
        .all(txn)
        .await
        .map_err(db_err("find plans holding test cases"))?
        .into_iter()
        .map(|entry| entry.plan_id)
        .collect();
    // Fixed lock order across plans.
    plan_ids.sort();
    plan_ids.dedup();

    let removed: HashSet<Uuid> = test_case_ids.iter().copied().collect();
    for plan_id in &plan_ids {
        lock_plan(txn, *plan_id).await?;
        let entries = load_order(txn, *plan_id).await?;

        PlanCase::delete_many()
            .filter(plan_case::Column::PlanId.eq(*plan_id))
            .filter(plan_case::Column::TestCaseId.is_in(removed.iter().copied()))
            .exec(txn)
            .await
            .map_err(db_err("remove test cases from plan"))?;

        let current: Vec<(Uuid, i32)> = entries.iter().map(|e| (e.id, e.position)).collect();
        let order: Vec<Uuid> = entries
            .iter()
            .filter(|e| !removed.contains(&e.test_case_id))
            .map(|e| e.id)
            .collect();
        write_positions(txn, &ordering::position_changes(&current, &order)).await?;
    }

    Ok(plan_ids)
}

/// Plan entries in position order.
pub(crate) async fn load_order<C: ConnectionTrait>(
    conn: &C,
    plan_id: Uuid,
) -> AppResult<Vec<plan_case::Model>> {
    PlanCase::find()
        .filter(plan_case::Column::PlanId.eq(plan_id))
        .order_by_asc(plan_case::Column::Position)
        .order_by_asc(plan_case::Column::Id)
        .all(conn)
        .await
        .map_err(db_err("load plan cases"))
}

async fn write_positions(txn: &DatabaseTransaction, changes: &[(Uuid, i32)]) -> AppResult<()> {
    for (id, position) in changes {
        PlanCase::update_many()
            .col_expr(plan_case::Column::Position, Expr::value(*position))
            .filter(plan_case::Column::Id.eq(*id))
            .exec(txn)
            .await
            .map_err(db_err("renumber plan cases"))?;
    }
    Ok(())
}

/// Map unique-key violations to Conflict, anything else to Database.
pub(crate) fn unique_violation_or(err: DbErr, conflict: impl FnOnce() -> String) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict()),
        _ => AppError::Database(err.to_string()),
    }
}
