//! Test case and test point API handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTestCaseRequest, CreateTestPointRequest, MoveRequest, TestCaseListItem,
    TestCaseResponse, TestPointResponse, UpdateTestCaseRequest, UpdateTestPointRequest,
};

/// Create a test case inside a group.
#[utoipa::path(
    post,
    path = "/api/v1/test-cases",
    tag = "Test Cases",
    request_body = CreateTestCaseRequest,
    responses(
        (status = 201, description = "Test case created", body = TestCaseResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_test_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateTestCaseRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;

    let case = pool
        .insert_test_case(body.into_inner(), Some(auth.user_id))
        .await?;
    info!(
        "Test case created: id={}, group_id={}",
        case.id, case.group_id
    );

    Ok(HttpResponse::Created().json(TestCaseResponse::from(case)))
}

/// List the test cases of a project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/test-cases",
    tag = "Test Cases",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Test cases", body = Vec<TestCaseListItem>)),
    security(("bearer_auth" = []))
)]
pub async fn list_test_cases(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let items: Vec<TestCaseListItem> = pool
        .list_test_cases(path.into_inner())
        .await?
        .into_iter()
        .map(|(case, group_name)| TestCaseListItem {
            case: case.into(),
            group_name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(items))
}

/// Get a test case.
#[utoipa::path(
    get,
    path = "/api/v1/test-cases/{test_case_id}",
    tag = "Test Cases",
    params(("test_case_id" = Uuid, Path, description = "Test case UUID")),
    responses(
        (status = 200, description = "Test case", body = TestCaseResponse),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_test_case(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let case_id = path.into_inner();
    let case = pool
        .get_test_case_by_id(case_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test case {}", case_id)))?;

    Ok(HttpResponse::Ok().json(TestCaseResponse::from(case)))
}

/// Edit a test case, move it to another group or change its status.
#[utoipa::path(
    put,
    path = "/api/v1/test-cases/{test_case_id}",
    tag = "Test Cases",
    params(("test_case_id" = Uuid, Path, description = "Test case UUID")),
    request_body = UpdateTestCaseRequest,
    responses(
        (status = 200, description = "Test case updated", body = TestCaseResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Test case or group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_test_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTestCaseRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;

    let case = pool
        .update_test_case(path.into_inner(), body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(TestCaseResponse::from(case)))
}

/// Delete a test case and its points.
#[utoipa::path(
    delete,
    path = "/api/v1/test-cases/{test_case_id}",
    tag = "Test Cases",
    params(("test_case_id" = Uuid, Path, description = "Test case UUID")),
    responses(
        (status = 204, description = "Test case deleted"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Test case was captured by a test run", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_test_case(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    pool.delete_test_case(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Ordered steps of a test case.
#[utoipa::path(
    get,
    path = "/api/v1/test-cases/{test_case_id}/points",
    tag = "Test Cases",
    params(("test_case_id" = Uuid, Path, description = "Test case UUID")),
    responses((status = 200, description = "Test points by position", body = Vec<TestPointResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn list_test_points(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let points: Vec<TestPointResponse> = pool
        .list_test_points(path.into_inner())
        .await?
        .into_iter()
        .map(TestPointResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(points))
}

/// Add a step to a test case.
#[utoipa::path(
    post,
    path = "/api/v1/test-cases/{test_case_id}/points",
    tag = "Test Cases",
    params(("test_case_id" = Uuid, Path, description = "Test case UUID")),
    request_body = CreateTestPointRequest,
    responses(
        (status = 201, description = "Test point created", body = TestPointResponse),
        (status = 400, description = "Invalid position", body = crate::error::ErrorResponse),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_test_point(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreateTestPointRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let req = body.into_inner();

    let point = pool
        .insert_test_point(path.into_inner(), &req.description, req.position)
        .await?;

    Ok(HttpResponse::Created().json(TestPointResponse::from(point)))
}

/// Edit the text of a step.
#[utoipa::path(
    put,
    path = "/api/v1/test-points/{point_id}",
    tag = "Test Cases",
    params(("point_id" = Uuid, Path, description = "Test point UUID")),
    request_body = UpdateTestPointRequest,
    responses(
        (status = 200, description = "Test point updated", body = TestPointResponse),
        (status = 404, description = "Test point not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_test_point(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTestPointRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;

    let point = pool
        .update_test_point(path.into_inner(), &body.description)
        .await?;

    Ok(HttpResponse::Ok().json(TestPointResponse::from(point)))
}

/// Move a step to another position; returns the renumbered steps.
#[utoipa::path(
    put,
    path = "/api/v1/test-points/{point_id}/position",
    tag = "Test Cases",
    params(("point_id" = Uuid, Path, description = "Test point UUID")),
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Steps after the move", body = Vec<TestPointResponse>),
        (status = 400, description = "Position out of range", body = crate::error::ErrorResponse),
        (status = 404, description = "Test point not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn move_test_point(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<MoveRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;

    let points: Vec<TestPointResponse> = pool
        .move_test_point(path.into_inner(), body.position)
        .await?
        .into_iter()
        .map(TestPointResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(points))
}

/// Delete a step; later steps move up by one.
#[utoipa::path(
    delete,
    path = "/api/v1/test-points/{point_id}",
    tag = "Test Cases",
    params(("point_id" = Uuid, Path, description = "Test point UUID")),
    responses(
        (status = 204, description = "Test point deleted"),
        (status = 404, description = "Test point not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_test_point(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    pool.delete_test_point(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure test case routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/test-cases").route(web::post().to(create_test_case)))
        .service(
            web::resource("/projects/{project_id}/test-cases")
                .route(web::get().to(list_test_cases)),
        )
        .service(
            web::resource("/test-cases/{test_case_id}")
                .route(web::get().to(get_test_case))
                .route(web::put().to(update_test_case))
                .route(web::delete().to(delete_test_case)),
        )
        .service(
            web::resource("/test-cases/{test_case_id}/points")
                .route(web::get().to(list_test_points))
                .route(web::post().to(create_test_point)),
        )
        .service(
            web::resource("/test-points/{point_id}")
                .route(web::put().to(update_test_point))
                .route(web::delete().to(delete_test_point)),
        )
        .service(
            web::resource("/test-points/{point_id}/position")
                .route(web::put().to(move_test_point)),
        );
}
