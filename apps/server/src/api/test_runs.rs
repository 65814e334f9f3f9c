//! Test run API handlers: starting runs, assignment and recording outcomes.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{
    AddRunUserRequest, AssignTestsRequest, FinishTestCaseRequest, GroupNode, RunCaseResponse,
    RunCaseStatus, RunListItem, RunResponse, RunTreeFilter, RunTreeQuery, StartRunResponse,
    UnassignTestsRequest, UserResponse,
};
use crate::services::build_tree;

/// Start a run of a plan against a release.
///
/// Every case of the plan is snapshotted into the run as `untested`;
/// later edits to the plan do not affect the run.
#[utoipa::path(
    post,
    path = "/api/v1/releases/{release_id}/plans/{plan_id}/runs",
    tag = "Test Runs",
    params(
        ("release_id" = Uuid, Path, description = "Release UUID"),
        ("plan_id" = Uuid, Path, description = "Plan UUID"),
    ),
    responses(
        (status = 201, description = "Run started", body = StartRunResponse),
        (status = 400, description = "Plan not linked to release", body = crate::error::ErrorResponse),
        (status = 404, description = "Release or plan not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_run(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let (release_id, plan_id) = path.into_inner();

    let (run, case_count) = pool
        .start_run(release_id, plan_id, Some(auth.user_id))
        .await?;

    Ok(HttpResponse::Created().json(StartRunResponse {
        run: run.into(),
        case_count,
    }))
}

/// All runs, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/runs",
    tag = "Test Runs",
    responses((status = 200, description = "Runs", body = Vec<RunListItem>)),
    security(("bearer_auth" = []))
)]
pub async fn list_runs(_auth: CurrentUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let runs = pool.list_runs().await?;
    Ok(HttpResponse::Ok().json(runs))
}

/// Get a run with its plan, release and progress.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Run", body = RunListItem),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_run(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = pool.get_run_detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(run))
}

/// Close a run. No outcomes can be recorded afterwards.
#[utoipa::path(
    post,
    path = "/api/v1/runs/{run_id}/finish",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Run finished", body = RunResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run already finished", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn finish_run(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let run = pool.finish_run(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(RunResponse::from(run)))
}

/// The run's snapshotted cases.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/cases",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Run cases", body = Vec<RunCaseResponse>),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_run_cases(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let cases: Vec<RunCaseResponse> = pool
        .get_run_cases(path.into_inner())
        .await?
        .into_iter()
        .map(RunCaseResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(cases))
}

/// Users taking part in a run.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/users",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    responses(
        (status = 200, description = "Participants", body = Vec<UserResponse>),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_run_users(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let users: Vec<UserResponse> = pool
        .list_run_users(path.into_inner())
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Add a participant to a run.
#[utoipa::path(
    post,
    path = "/api/v1/runs/{run_id}/users",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    request_body = AddRunUserRequest,
    responses(
        (status = 204, description = "User added"),
        (status = 404, description = "Run or user not found", body = crate::error::ErrorResponse),
        (status = 409, description = "User already in run", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_run_user(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AddRunUserRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    pool.add_user_to_run(path.into_inner(), body.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Assign run cases to a user.
#[utoipa::path(
    post,
    path = "/api/v1/runs/{run_id}/assign",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    request_body = AssignTestsRequest,
    responses(
        (status = 200, description = "Updated run cases", body = Vec<RunCaseResponse>),
        (status = 404, description = "Run, user or case not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run is finished", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_tests(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AssignTestsRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let run_id = path.into_inner();
    let req = body.into_inner();

    let cases: Vec<RunCaseResponse> = pool
        .assign_tests(run_id, req.user_id, &req.test_ids)
        .await?
        .into_iter()
        .map(RunCaseResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(cases))
}

/// Clear the assignee of run cases.
#[utoipa::path(
    post,
    path = "/api/v1/runs/{run_id}/unassign",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    request_body = UnassignTestsRequest,
    responses(
        (status = 200, description = "Updated run cases", body = Vec<RunCaseResponse>),
        (status = 404, description = "Run or case not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run is finished", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_tests(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UnassignTestsRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;

    let cases: Vec<RunCaseResponse> = pool
        .unassign_tests(path.into_inner(), &body.test_ids)
        .await?
        .into_iter()
        .map(RunCaseResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(cases))
}

/// Record the outcome of one case in a run.
#[utoipa::path(
    post,
    path = "/api/v1/runs/{run_id}/results",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Run UUID")),
    request_body = FinishTestCaseRequest,
    responses(
        (status = 200, description = "Outcome recorded", body = RunCaseResponse),
        (status = 400, description = "Status is not OK, NOK or BLOCKED", body = crate::error::ErrorResponse),
        (status = 404, description = "Run or case not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run is finished", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn finish_test_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<FinishTestCaseRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let run_id = path.into_inner();
    let req = body.into_inner();
    let status = RunCaseStatus::parse_outcome(&req.status)?;

    let case = pool
        .finish_test_case(run_id, req.test_case_id, status, req.comment)
        .await?;

    Ok(HttpResponse::Ok().json(RunCaseResponse::from(case)))
}

/// The run's cases arranged under their groups.
///
/// `assigned_to` is `all`, `unassigned` or a user id; `statuses` is a
/// comma separated list. Filters drop cases, never groups.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/tree",
    tag = "Test Runs",
    params(
        ("run_id" = Uuid, Path, description = "Run UUID"),
        RunTreeQuery,
    ),
    responses(
        (status = 200, description = "Root groups", body = Vec<GroupNode>),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_run_tree(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<RunTreeQuery>,
) -> AppResult<HttpResponse> {
    let filter = RunTreeFilter::from_query(&query)?;
    let rows = pool.run_tree_rows(path.into_inner(), &filter).await?;

    Ok(HttpResponse::Ok().json(build_tree(rows)))
}

/// Configure test run routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/releases/{release_id}/plans/{plan_id}/runs")
            .route(web::post().to(start_run)),
    )
    .service(web::resource("/runs").route(web::get().to(list_runs)))
    .service(web::resource("/runs/{run_id}").route(web::get().to(get_run)))
    .service(web::resource("/runs/{run_id}/finish").route(web::post().to(finish_run)))
    .service(web::resource("/runs/{run_id}/cases").route(web::get().to(list_run_cases)))
    .service(
        web::resource("/runs/{run_id}/users")
            .route(web::get().to(list_run_users))
            .route(web::post().to(add_run_user)),
    )
    .service(web::resource("/runs/{run_id}/assign").route(web::post().to(assign_tests)))
    .service(web::resource("/runs/{run_id}/unassign").route(web::post().to(unassign_tests)))
    .service(web::resource("/runs/{run_id}/results").route(web::post().to(finish_test_case)))
    .service(web::resource("/runs/{run_id}/tree").route(web::get().to(get_run_tree)));
}
