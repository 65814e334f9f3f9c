//! Database queries for the ordered steps (test points) of a test case.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::test_case::Entity as TestCase;
use crate::entity::test_point::{self as point, ActiveModel, Entity as TestPoint};
use crate::error::{ensure_non_empty, AppError, AppResult};
use crate::services::ordering;

use super::{db_err, finalize_transaction, DbPool};

impl DbPool {
    /// Points of a test case in position order.
    pub async fn list_test_points(&self, test_case_id: Uuid) -> AppResult<Vec<point::Model>> {
        TestPoint::find()
            .filter(point::Column::TestCaseId.eq(test_case_id))
            .order_by_asc(point::Column::Position)
            .all(self.connection())
            .await
            .map_err(db_err("list test points"))
    }

    /// Add a point, appended or inserted at a 1-based position.
    pub async fn insert_test_point(
        &self,
        test_case_id: Uuid,
        description: &str,
        position: Option<i32>,
    ) -> AppResult<point::Model> {
        ensure_non_empty("description", description)?;
        let txn = self.begin().await?;

        let result: AppResult<point::Model> = async {
            let current = lock_points(&txn, test_case_id).await?;
            let id = Uuid::now_v7();

            let mut order: Vec<Uuid> = current.iter().map(|(id, _)| *id).collect();
            ordering::insert_at(&mut order, id, position)?;
            let target = order.iter().position(|p| *p == id).unwrap_or(order.len() - 1) as i32 + 1;

            let shifted: Vec<(Uuid, i32)> = ordering::position_changes(&current, &order)
                .into_iter()
                .filter(|(changed, _)| *changed != id)
                .collect();
            write_positions(&txn, &shifted).await?;

            let model = ActiveModel {
                id: Set(id),
                test_case_id: Set(test_case_id),
                description: Set(description.trim().to_string()),
                position: Set(target),
                created_at: Set(Utc::now()),
            };
            model.insert(&txn).await.map_err(db_err("insert test point"))
        }
        .await;

        finalize_transaction(txn, result).await
    }

    /// Replace the description of a point.
    pub async fn update_test_point(&self, id: Uuid, description: &str) -> AppResult<point::Model> {
        ensure_non_empty("description", description)?;

        let point = TestPoint::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get test point"))?
            .ok_or_else(|| AppError::NotFound(format!("Test point {}", id)))?;

        let mut active: ActiveModel = point.into();
        active.description = Set(description.trim().to_string());

        active
            .update(self.connection())
            .await
            .map_err(db_err("update test point"))
    }

    /// Move a point to a 1-based position, shifting the ones in between.
    pub async fn move_test_point(&self, id: Uuid, position: i32) -> AppResult<Vec<point::Model>> {
        let txn = self.begin().await?;

        let result: AppResult<Uuid> = async {
            let point = find_point(&txn, id).await?;
            let current = lock_points(&txn, point.test_case_id).await?;

            let mut order: Vec<Uuid> = current.iter().map(|(id, _)| *id).collect();
            ordering::move_to(&mut order, id, position)?;
            write_positions(&txn, &ordering::position_changes(&current, &order)).await?;

            Ok(point.test_case_id)
        }
        .await;

        let test_case_id = finalize_transaction(txn, result).await?;
        self.list_test_points(test_case_id).await
    }

    /// Delete a point and close the gap it leaves.
    pub async fn delete_test_point(&self, id: Uuid) -> AppResult<point::Model> {
        let txn = self.begin().await?;

        let result: AppResult<point::Model> = async {
            let point = find_point(&txn, id).await?;
            let current = lock_points(&txn, point.test_case_id).await?;

            TestPoint::delete_by_id(id)
                .exec(&txn)
                .await
                .map_err(db_err("delete test point"))?;

            let order: Vec<Uuid> = current
                .iter()
                .map(|(pid, _)| *pid)
                .filter(|pid| *pid != id)
                .collect();
            write_positions(&txn, &ordering::position_changes(&current, &order)).await?;

            Ok(point)
        }
        .await;

        let point = finalize_transaction(txn, result).await?;
        info!(
            "Deleted test point {} from test case {}",
            point.id, point.test_case_id
        );
        Ok(point)
    }
}

async fn find_point(txn: &DatabaseTransaction, id: Uuid) -> AppResult<point::Model> {
    TestPoint::find_by_id(id)
        .one(txn)
        .await
        .map_err(db_err("get test point"))?
        .ok_or_else(|| AppError::NotFound(format!("Test point {}", id)))
}

/// Lock the owning test case and load `(id, position)` of its points in order.
async fn lock_points(
    txn: &DatabaseTransaction,
    test_case_id: Uuid,
) -> AppResult<Vec<(Uuid, i32)>> {
    TestCase::find_by_id(test_case_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err("lock test case"))?
        .ok_or_else(|| AppError::NotFound(format!("Test case {}", test_case_id)))?;

    let points = TestPoint::find()
        .filter(point::Column::TestCaseId.eq(test_case_id))
        .order_by_asc(point::Column::Position)
        .order_by_asc(point::Column::Id)
        .all(txn)
        .await
        .map_err(db_err("load test points"))?;

    Ok(points.into_iter().map(|p| (p.id, p.position)).collect())
}

async fn write_positions(txn: &DatabaseTransaction, changes: &[(Uuid, i32)]) -> AppResult<()> {
    for (id, position) in changes {
        TestPoint::update_many()
            .col_expr(point::Column::Position, Expr::value(*position))
            .filter(point::Column::Id.eq(*id))
            .exec(txn)
            .await
            .map_err(db_err("renumber test points"))?;
    }
    Ok(())
}
