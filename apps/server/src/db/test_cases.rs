//! Database queries for test cases.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::test_case::{self, ActiveModel, Entity as TestCase};
use crate::entity::test_group::{self as group, Entity as TestGroup};
use crate::error::{ensure_non_empty, AppError, AppResult};
use crate::models::{CreateTestCaseRequest, TestCaseStatus, UpdateTestCaseRequest};

use super::groups::require_group;
use super::test_plans::detach_cases_from_plans;
use super::test_runs::ensure_no_run_history;
use super::{db_err, finalize_transaction, DbPool};

impl DbPool {
    /// Create a draft test case inside a group. The project is taken from the group.
    pub async fn insert_test_case(
        &self,
        req: CreateTestCaseRequest,
        created_by: Option<Uuid>,
    ) -> AppResult<test_case::Model> {
        ensure_non_empty("title", &req.title)?;
        let group = require_group(self.connection(), req.group_id).await?;
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(group.project_id),
            group_id: Set(group.id),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            expected_result: Set(req.expected_result),
            status: Set(TestCaseStatus::Draft.as_str().to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(db_err("insert test case"))
    }

    /// Get a test case by ID.
    pub async fn get_test_case_by_id(&self, id: Uuid) -> AppResult<Option<test_case::Model>> {
        TestCase::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get test case"))
    }

    /// Apply a partial edit. Moving to a group of another project is rejected.
    pub async fn update_test_case(
        &self,
        id: Uuid,
        req: UpdateTestCaseRequest,
    ) -> AppResult<test_case::Model> {
        if let Some(title) = req.title.as_deref() {
            ensure_non_empty("title", title)?;
        }

        let case = require_test_case(self.connection(), id).await?;

        if let Some(group_id) = req.group_id {
            let target = require_group(self.connection(), group_id).await?;
            if target.project_id != case.project_id {
                return Err(AppError::InvalidInput(
                    "test case cannot move to a group of another project".to_string(),
                ));
            }
        }

        let mut active: ActiveModel = case.into();
        if let Some(title) = req.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = req.description {
            active.description = Set(description);
        }
        if let Some(expected_result) = req.expected_result {
            active.expected_result = Set(expected_result);
        }
        if let Some(group_id) = req.group_id {
            active.group_id = Set(group_id);
        }
        if let Some(status) = req.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(db_err("update test case"))
    }

    /// Delete a test case with its points, closing the gap it leaves in
    /// every plan. Cases captured by a run are refused with Conflict.
    pub async fn delete_test_case(&self, id: Uuid) -> AppResult<test_case::Model> {
        let txn = self.begin().await?;

        let result: AppResult<(test_case::Model, usize)> = async {
            let case = TestCase::find_by_id(id)
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err("lock test case"))?
                .ok_or_else(|| AppError::NotFound(format!("Test case {}", id)))?;

            ensure_no_run_history(&txn, &[id]).await?;
            let plans = detach_cases_from_plans(&txn, &[id]).await?;

            TestCase::delete_by_id(id)
                .exec(&txn)
                .await
                .map_err(db_err("delete test case"))?;

            Ok((case, plans.len()))
        }
        .await;

        let (case, plan_count) = finalize_transaction(txn, result).await?;
        info!("Deleted test case {} (removed from {} plans)", case.id, plan_count);
        Ok(case)
    }

    /// All cases of a project with their group name, ordered by group then creation.
    pub async fn list_test_cases(
        &self,
        project_id: Uuid,
    ) -> AppResult<Vec<(test_case::Model, Option<String>)>> {
        let cases = TestCase::find()
            .filter(test_case::Column::ProjectId.eq(project_id))
            .order_by_asc(test_case::Column::GroupId)
            .order_by_asc(test_case::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list test cases"))?;

        let groups: HashMap<Uuid, String> = TestGroup::find()
            .filter(group::Column::ProjectId.eq(project_id))
            .all(self.connection())
            .await
            .map_err(db_err("list groups"))?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();

        Ok(cases
            .into_iter()
            .map(|c| {
                let group_name = groups.get(&c.group_id).cloned();
                (c, group_name)
            })
            .collect())
    }
}

/// Fetch a test case or fail with NotFound.
pub(crate) async fn require_test_case<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<test_case::Model> {
    TestCase::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err("get test case"))?
        .ok_or_else(|| AppError::NotFound(format!("Test case {}", id)))
}
