//! Test plan API handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AddPlanCaseRequest, ClonePlanRequest, ClonePlanResponse, CreatePlanRequest, MoveRequest,
    PlanCaseView, PlanDetailResponse, PlanResponse, PlanWithRelease, RenamePlanRequest,
};

/// Create a plan and link it to a release.
#[utoipa::path(
    post,
    path = "/api/v1/releases/{release_id}/plans",
    tag = "Test Plans",
    params(("release_id" = Uuid, Path, description = "Release UUID")),
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created", body = PlanResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Release not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_plan(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreatePlanRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let release_id = path.into_inner();
    let req = body.into_inner();

    let plan = pool
        .create_plan_in_release(release_id, &req.name, &req.description, Some(auth.user_id))
        .await?;

    Ok(HttpResponse::Created().json(PlanResponse::from(plan)))
}

/// Plans linked to a release.
#[utoipa::path(
    get,
    path = "/api/v1/releases/{release_id}/plans",
    tag = "Test Plans",
    params(("release_id" = Uuid, Path, description = "Release UUID")),
    responses(
        (status = 200, description = "Plans", body = Vec<PlanResponse>),
        (status = 404, description = "Release not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_release_plans(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let plans: Vec<PlanResponse> = pool
        .list_plans_for_release(path.into_inner())
        .await?
        .into_iter()
        .map(PlanResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(plans))
}

/// Every plan of a project with the release it belongs to.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/plans",
    tag = "Test Plans",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Plans with releases", body = Vec<PlanWithRelease>)),
    security(("bearer_auth" = []))
)]
pub async fn list_project_plans(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let plans: Vec<PlanWithRelease> = pool
        .list_plans_for_project(path.into_inner())
        .await?
        .into_iter()
        .map(|(plan, release)| PlanWithRelease {
            plan: plan.into(),
            release: release.into(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(plans))
}

/// A plan with its ordered cases.
#[utoipa::path(
    get,
    path = "/api/v1/plans/{plan_id}",
    tag = "Test Plans",
    params(("plan_id" = Uuid, Path, description = "Plan UUID")),
    responses(
        (status = 200, description = "Plan detail", body = PlanDetailResponse),
        (status = 404, description = "Plan not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_plan(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let plan_id = path.into_inner();
    let plan = pool
        .get_plan_by_id(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test plan {}", plan_id)))?;
    let cases = pool.get_plan_cases(plan_id).await?;

    Ok(HttpResponse::Ok().json(PlanDetailResponse {
        plan: plan.into(),
        cases,
    }))
}

/// Rename a plan.
#[utoipa::path(
    put,
    path = "/api/v1/plans/{plan_id}",
    tag = "Test Plans",
    params(("plan_id" = Uuid, Path, description = "Plan UUID")),
    request_body = RenamePlanRequest,
    responses(
        (status = 200, description = "Plan renamed", body = PlanResponse),
        (status = 400, description = "Empty name", body = crate::error::ErrorResponse),
        (status = 404, description = "Plan not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_plan(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<RenamePlanRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let plan = pool.rename_plan(path.into_inner(), &body.name).await?;

    Ok(HttpResponse::Ok().json(PlanResponse::from(plan)))
}

/// Delete a plan. Runs already started from it are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/plans/{plan_id}",
    tag = "Test Plans",
    params(("plan_id" = Uuid, Path, description = "Plan UUID")),
    responses(
        (status = 204, description = "Plan deleted"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Plan not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_plan(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    pool.delete_plan(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Copy a plan and its ordered cases into a release.
#[utoipa::path(
    post,
    path = "/api/v1/plans/{plan_id}/clone",
    tag = "Test Plans",
    params(("plan_id" = Uuid, Path, description = "Source plan UUID")),
    request_body = ClonePlanRequest,
    responses(
        (status = 201, description = "Plan cloned", body = ClonePlanResponse),
        (status = 400, description = "Release belongs to another project", body = crate::error::ErrorResponse),
        (status = 404, description = "Plan or release not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn clone_plan(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<ClonePlanRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let source_id = path.into_inner();

    let (plan, test_case_ids) = pool
        .clone_plan(source_id, body.release_id, Some(auth.user_id))
        .await?;

    Ok(HttpResponse::Created().json(ClonePlanResponse {
        plan: plan.into(),
        test_case_ids,
    }))
}

/// Append a test case to the end of a plan.
#[utoipa::path(
    post,
    path = "/api/v1/plans/{plan_id}/cases",
    tag = "Test Plans",
    params(("plan_id" = Uuid, Path, description = "Plan UUID")),
    request_body = AddPlanCaseRequest,
    responses(
        (status = 201, description = "Case added; returns the plan's cases", body = Vec<PlanCaseView>),
        (status = 404, description = "Plan or test case not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Case already in plan", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_plan_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AddPlanCaseRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let plan_id = path.into_inner();

    pool.add_case_to_plan(plan_id, body.test_case_id).await?;
    let cases = pool.get_plan_cases(plan_id).await?;

    Ok(HttpResponse::Created().json(cases))
}

/// Remove a test case from a plan; later cases move up by one.
#[utoipa::path(
    delete,
    path = "/api/v1/plans/{plan_id}/cases/{test_case_id}",
    tag = "Test Plans",
    params(
        ("plan_id" = Uuid, Path, description = "Plan UUID"),
        ("test_case_id" = Uuid, Path, description = "Test case UUID"),
    ),
    responses(
        (status = 200, description = "Remaining cases", body = Vec<PlanCaseView>),
        (status = 404, description = "Case not in plan", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_plan_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let (plan_id, test_case_id) = path.into_inner();

    pool.remove_case_from_plan(plan_id, test_case_id).await?;
    let cases = pool.get_plan_cases(plan_id).await?;

    Ok(HttpResponse::Ok().json(cases))
}

/// Move a case within a plan.
#[utoipa::path(
    put,
    path = "/api/v1/plans/{plan_id}/cases/{test_case_id}/position",
    tag = "Test Plans",
    params(
        ("plan_id" = Uuid, Path, description = "Plan UUID"),
        ("test_case_id" = Uuid, Path, description = "Test case UUID"),
    ),
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Cases after the move", body = Vec<PlanCaseView>),
        (status = 400, description = "Position out of range", body = crate::error::ErrorResponse),
        (status = 404, description = "Case not in plan", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn move_plan_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<MoveRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let (plan_id, test_case_id) = path.into_inner();

    let cases = pool
        .move_case_in_plan(plan_id, test_case_id, body.position)
        .await?;

    Ok(HttpResponse::Ok().json(cases))
}

/// Configure test plan routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/releases/{release_id}/plans")
            .route(web::get().to(list_release_plans))
            .route(web::post().to(create_plan)),
    )
    .service(web::resource("/projects/{project_id}/plans").route(web::get().to(list_project_plans)))
    .service(
        web::resource("/plans/{plan_id}")
            .route(web::get().to(get_plan))
            .route(web::put().to(rename_plan))
            .route(web::delete().to(delete_plan)),
    )
    .service(web::resource("/plans/{plan_id}/clone").route(web::post().to(clone_plan)))
    .service(web::resource("/plans/{plan_id}/cases").route(web::post().to(add_plan_case)))
    .service(
        web::resource("/plans/{plan_id}/cases/{test_case_id}")
            .route(web::delete().to(remove_plan_case)),
    )
    .service(
        web::resource("/plans/{plan_id}/cases/{test_case_id}/position")
            .route(web::put().to(move_plan_case)),
    );
}
