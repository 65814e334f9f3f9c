//! Database queries for test groups and the project tree projection.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::test_case::{self, Entity as TestCase};
use crate::entity::test_group::{self as group, ActiveModel, Entity as TestGroup};
use crate::error::{ensure_non_empty, AppError, AppResult};
use crate::models::{GroupCaseCount, TreeRow};

use super::test_plans::detach_cases_from_plans;
use super::test_runs::ensure_no_run_history;
use super::{db_err, finalize_transaction, DbPool};

impl DbPool {
    /// Create a root group in a project.
    pub async fn insert_group(
        &self,
        project_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> AppResult<group::Model> {
        self.insert_group_row(project_id, None, name, description)
            .await
    }

    /// Create a group nested under `parent_id`, inheriting its project.
    pub async fn insert_subgroup(
        &self,
        parent_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> AppResult<group::Model> {
        let parent = require_group(self.connection(), parent_id).await?;
        self.insert_group_row(parent.project_id, Some(parent.id), name, description)
            .await
    }

    async fn insert_group_row(
        &self,
        project_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
        description: Option<String>,
    ) -> AppResult<group::Model> {
        ensure_non_empty("name", name)?;
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            parent_id: Set(parent_id),
            name: Set(name.trim().to_string()),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(db_err("insert group"))
    }

    /// Get a group by ID.
    pub async fn get_group_by_id(&self, id: Uuid) -> AppResult<Option<group::Model>> {
        TestGroup::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get group"))
    }

    /// Edit name and/or description. At least one must be supplied.
    pub async fn update_group(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<group::Model> {
        if name.is_none() && description.is_none() {
            return Err(AppError::InvalidInput(
                "nothing to update, provide name or description".to_string(),
            ));
        }
        if let Some(name) = name.as_deref() {
            ensure_non_empty("name", name)?;
        }

        let group = require_group(self.connection(), id).await?;

        let mut active: ActiveModel = group.into();
        if let Some(name) = name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(db_err("update group"))
    }

    /// Delete a group. Descendant groups and their cases go with it, and
    /// those cases leave every plan that held them. Refused with Conflict
    /// when any of the cases was captured by a run.
    pub async fn delete_group(&self, id: Uuid) -> AppResult<group::Model> {
        let txn = self.begin().await?;

        let result: AppResult<(group::Model, usize)> = async {
            let group = TestGroup::find_by_id(id)
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err("lock group"))?
                .ok_or_else(|| AppError::NotFound(format!("Group {}", id)))?;

            let project_groups = TestGroup::find()
                .filter(group::Column::ProjectId.eq(group.project_id))
                .all(&txn)
                .await
                .map_err(db_err("list groups"))?;
            let subtree = subtree_ids(
                id,
                project_groups.iter().map(|g| (g.id, g.parent_id)),
            );

            let case_ids: Vec<Uuid> = TestCase::find()
                .filter(test_case::Column::GroupId.is_in(subtree.iter().copied()))
                .all(&txn)
                .await
                .map_err(db_err("list cases of group subtree"))?
                .into_iter()
                .map(|c| c.id)
                .collect();

            ensure_no_run_history(&txn, &case_ids).await?;
            detach_cases_from_plans(&txn, &case_ids).await?;

            TestGroup::delete_by_id(id)
                .exec(&txn)
                .await
                .map_err(db_err("delete group"))?;

            Ok((group, case_ids.len()))
        }
        .await;

        let (group, case_count) = finalize_transaction(txn, result).await?;
        info!("Deleted group {} with {} test cases", group.id, case_count);
        Ok(group)
    }

    /// All groups of a project, oldest first.
    pub async fn list_groups(&self, project_id: Uuid) -> AppResult<Vec<group::Model>> {
        TestGroup::find()
            .filter(group::Column::ProjectId.eq(project_id))
            .order_by_asc(group::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list groups"))
    }

    /// Flat rows for the project tree: each case joined with its group, plus
    /// one row for every group without cases.
    pub async fn project_tree_rows(&self, project_id: Uuid) -> AppResult<Vec<TreeRow>> {
        let groups = self.list_groups(project_id).await?;

        let cases = TestCase::find()
            .filter(test_case::Column::ProjectId.eq(project_id))
            .order_by_asc(test_case::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list test cases for tree"))?;

        let mut by_group: HashMap<Uuid, Vec<test_case::Model>> = HashMap::new();
        for case in cases {
            by_group.entry(case.group_id).or_default().push(case);
        }

        let mut rows = Vec::new();
        for group in groups {
            match by_group.remove(&group.id) {
                None => rows.push(TreeRow::group_only(group.id, group.name, group.parent_id)),
                Some(cases) => {
                    for case in cases {
                        rows.push(TreeRow {
                            case_id: Some(case.id),
                            case_title: Some(case.title),
                            case_status: Some(case.status),
                            ..TreeRow::group_only(group.id, group.name.clone(), group.parent_id)
                        });
                    }
                }
            }
        }

        Ok(rows)
    }

    /// Number of cases filed directly under each group of a project.
    pub async fn case_counts_by_group(&self, project_id: Uuid) -> AppResult<Vec<GroupCaseCount>> {
        let groups = self.list_groups(project_id).await?;

        let counts: HashMap<Uuid, i64> = TestCase::find()
            .select_only()
            .column(test_case::Column::GroupId)
            .column_as(
                Expr::from(Func::count(Expr::col(test_case::Column::Id))),
                "total_cases",
            )
            .filter(test_case::Column::ProjectId.eq(project_id))
            .group_by(test_case::Column::GroupId)
            .into_tuple::<(Uuid, i64)>()
            .all(self.connection())
            .await
            .map_err(db_err("count test cases"))?
            .into_iter()
            .collect();

        Ok(groups
            .into_iter()
            .map(|g| GroupCaseCount {
                total_cases: counts.get(&g.id).copied().unwrap_or(0) as u64,
                group_id: g.id,
                name: g.name,
            })
            .collect())
    }
}

/// Fetch a group or fail with NotFound.
pub(crate) async fn require_group<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<group::Model> {
    TestGroup::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err("get group"))?
        .ok_or_else(|| AppError::NotFound(format!("Group {}", id)))
}

/// `root` and every group below it, given `(id, parent_id)` pairs.
fn subtree_ids(root: Uuid, groups: impl IntoIterator<Item = (Uuid, Option<Uuid>)>) -> Vec<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (id, parent_id) in groups {
        if let Some(parent_id) = parent_id {
            children.entry(parent_id).or_default().push(id);
        }
    }

    let mut out = vec![root];
    let mut next = 0;
    while next < out.len() {
        if let Some(kids) = children.get(&out[next]) {
            for kid in kids {
                if !out.contains(kid) {
                    out.push(*kid);
                }
            }
        }
        next += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtree_ids_follows_nesting_only() {
        let root = Uuid::now_v7();
        let child = Uuid::now_v7();
        let grandchild = Uuid::now_v7();
        let sibling = Uuid::now_v7();

        let ids = subtree_ids(
            root,
            vec![
                (root, None),
                (child, Some(root)),
                (grandchild, Some(child)),
                (sibling, None),
            ],
        );
        assert_eq!(ids, vec![root, child, grandchild]);
    }
}
