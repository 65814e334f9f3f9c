//! Database queries for users.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::user::{self, ActiveModel, Entity as User};
use crate::error::{ensure_non_empty, AppError, AppResult};
use crate::models::UserRole;

use super::{db_err, DbPool};

impl DbPool {
    /// Insert a new user.
    pub async fn insert_user(
        &self,
        name: &str,
        email: Option<String>,
        role: UserRole,
    ) -> AppResult<user::Model> {
        ensure_non_empty("name", name)?;

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.trim().to_string()),
            email: Set(email),
            role: Set(role.as_str().to_string()),
            created_at: Set(Utc::now()),
        };

        model
            .insert(self.connection())
            .await
            .map_err(db_err("insert user"))
    }

    /// Get a user by ID.
    pub async fn get_user_by_id(&self, id: Uuid) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(db_err("get user"))
    }

    pub async fn list_users(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::Name)
            .order_by_asc(user::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_err("list users"))
    }
}

/// Fetch a user or fail with NotFound.
pub(crate) async fn require_user<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<user::Model> {
    User::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err("get user"))?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
}

/// Resolve display names for a set of user ids. Unknown ids are skipped.
pub(crate) async fn user_names<C: ConnectionTrait>(
    conn: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, String>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = User::find()
        .filter(user::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(db_err("resolve user names"))?;

    Ok(users.into_iter().map(|u| (u.id, u.name)).collect())
}
