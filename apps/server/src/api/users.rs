//! User API handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CreateUserRequest, RunListItem, UserResponse, UserRole};

/// Register a user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let req = body.into_inner();

    let user = pool
        .insert_user(&req.name, req.email, req.role.unwrap_or(UserRole::Tester))
        .await?;
    info!("User created: id={}, role={}", user.id, user.role);

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// List users.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(_auth: CurrentUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let users: Vec<UserResponse> = pool
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Get a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    params(("user_id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let user = pool
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Runs a user participates in.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/runs",
    tag = "Users",
    params(("user_id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Runs of the user", body = Vec<RunListItem>),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_user_runs(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let runs = pool.list_runs_for_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(runs))
}

/// Configure user routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::get().to(list_users))
            .route(web::post().to(create_user)),
    )
    .service(web::resource("/users/{user_id}").route(web::get().to(get_user)))
    .service(web::resource("/users/{user_id}/runs").route(web::get().to(list_user_runs)));
}
