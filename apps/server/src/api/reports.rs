//! Run report endpoints.

use actix_web::{HttpResponse, get, web};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{DashboardRun, RunProgress, RunTestRow, UserCount};
use crate::services::completion_percentage;

/// Configure report routes.
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_run_summary)
        .service(get_run_by_user)
        .service(get_run_tests)
        .service(get_dashboard);
}

/// Counts per status for a run.
///
/// GET /runs/{run_id}/summary
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/summary",
    tag = "Reports",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Status counts and progress", body = RunProgress),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/runs/{run_id}/summary")]
pub async fn get_run_summary(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let summary = pool.run_summary(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(RunProgress {
        summary,
        progress: completion_percentage(&summary),
    }))
}

/// Assigned case counts per user, including `unassigned`.
///
/// GET /runs/{run_id}/by-user
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/by-user",
    tag = "Reports",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Counts per assignee", body = Vec<UserCount>),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/runs/{run_id}/by-user")]
pub async fn get_run_by_user(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let counts = pool.run_by_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(counts))
}

/// Every case of a run with its status and assignee.
///
/// GET /runs/{run_id}/tests
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/tests",
    tag = "Reports",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Run test list", body = Vec<RunTestRow>),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/runs/{run_id}/tests")]
pub async fn get_run_tests(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let rows = pool.run_test_list(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Progress of every run still in progress.
///
/// GET /dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Reports",
    responses(
        (status = 200, description = "Active runs", body = Vec<DashboardRun>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/dashboard")]
pub async fn get_dashboard(_auth: CurrentUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let runs = pool.dashboard().await?;
    Ok(HttpResponse::Ok().json(runs))
}
