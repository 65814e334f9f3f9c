//! Database queries for releases.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::release::{self, ActiveModel, Entity as Release};
use crate::error::{ensure_non_empty, AppError, AppResult};
use crate::models::CreateReleaseRequest;

use super::test_plans::unique_violation_or;
use super::{db_err, DbPool};

impl DbPool {
    /// Insert a new release.
    pub async fn insert_release(
        &self,
        project_id: Uuid,
        req: CreateReleaseRequest,
    ) -> AppResult<release::Model> {
        ensure_non_empty("version", &req.version)?;

        let version = req.version.trim().to_string();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            version: Set(version.clone()),
            description: Set(req.description),
            released_at: Set(req.released_at),
            created_at: Set(Utc::now()),
        };

        model.insert(self.connection()).await.map_err(|e| {
            unique_violation_or(e, || format!("release {} already exists", version))
        })
    }

    /// Releases of a project, newest first.
    pub async fn list_releases(&self, project_id: Uuid) -> AppResult<Vec<release::Model>> {
        Release::find()
            .filter(release::Column::ProjectId.eq(project_id))
            .order_by_desc(release::Column::CreatedAt)
            .order_by_desc(release::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list releases"))
    }

    /// Get a release by ID.
    pub async fn get_release_by_id(&self, id: Uuid) -> AppResult<Option<release::Model>> {
        Release::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get release"))
    }

    /// Delete a release with its plan links and runs. Plans themselves survive.
    pub async fn delete_release(&self, id: Uuid) -> AppResult<release::Model> {
        let release = require_release(self.connection(), id).await?;

        Release::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(db_err("delete release"))?;

        Ok(release)
    }
}

/// Fetch a release or fail with NotFound.
pub(crate) async fn require_release<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<release::Model> {
    Release::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err("get release"))?
        .ok_or_else(|| AppError::NotFound(format!("Release {}", id)))
}
