//! Release API handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CreateReleaseRequest, ReleaseResponse};

/// Create a release in a project.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/releases",
    tag = "Releases",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = CreateReleaseRequest,
    responses(
        (status = 201, description = "Release created", body = ReleaseResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Version already exists", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_release(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreateReleaseRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let project_id = path.into_inner();

    let release = pool.insert_release(project_id, body.into_inner()).await?;
    info!(
        "Release created: id={}, version={}, project_id={}",
        release.id, release.version, project_id
    );

    Ok(HttpResponse::Created().json(ReleaseResponse::from(release)))
}

/// List the releases of a project, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/releases",
    tag = "Releases",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Releases", body = Vec<ReleaseResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn list_releases(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let releases: Vec<ReleaseResponse> = pool
        .list_releases(path.into_inner())
        .await?
        .into_iter()
        .map(ReleaseResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(releases))
}

/// Get a release.
#[utoipa::path(
    get,
    path = "/api/v1/releases/{release_id}",
    tag = "Releases",
    params(("release_id" = Uuid, Path, description = "Release UUID")),
    responses(
        (status = 200, description = "Release", body = ReleaseResponse),
        (status = 404, description = "Release not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_release(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let release_id = path.into_inner();
    let release = pool
        .get_release_by_id(release_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Release {}", release_id)))?;

    Ok(HttpResponse::Ok().json(ReleaseResponse::from(release)))
}

/// Delete a release with its plan links and runs.
#[utoipa::path(
    delete,
    path = "/api/v1/releases/{release_id}",
    tag = "Releases",
    params(("release_id" = Uuid, Path, description = "Release UUID")),
    responses(
        (status = 204, description = "Release deleted"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Release not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_release(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let release = pool.delete_release(path.into_inner()).await?;
    info!("Release deleted: id={}, by={}", release.id, auth.user_id);

    Ok(HttpResponse::NoContent().finish())
}

/// Configure release routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects/{project_id}/releases")
            .route(web::get().to(list_releases))
            .route(web::post().to(create_release)),
    )
    .service(
        web::resource("/releases/{release_id}")
            .route(web::get().to(get_release))
            .route(web::delete().to(delete_release)),
    );
}
