//! Test group and project tree API handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateGroupRequest, GroupCaseCount, GroupNode, GroupResponse, TreeRow, UpdateGroupRequest,
};
use crate::services::build_tree;

/// Create a root group in a project.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/groups",
    tag = "Groups",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Read-only role", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_group(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreateGroupRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let project_id = path.into_inner();
    let req = body.into_inner();

    let group = pool
        .insert_group(project_id, &req.name, req.description)
        .await?;
    info!("Group created: id={}, project_id={}", group.id, project_id);

    Ok(HttpResponse::Created().json(GroupResponse::from(group)))
}

/// Create a group nested under another group.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/subgroups",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Parent group UUID")),
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Subgroup created", body = GroupResponse),
        (status = 404, description = "Parent group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_subgroup(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreateGroupRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let parent_id = path.into_inner();
    let req = body.into_inner();

    let group = pool
        .insert_subgroup(parent_id, &req.name, req.description)
        .await?;
    info!("Subgroup created: id={}, parent_id={}", group.id, parent_id);

    Ok(HttpResponse::Created().json(GroupResponse::from(group)))
}

/// List the groups of a project as flat records.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/groups",
    tag = "Groups",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Groups", body = Vec<GroupResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn list_groups(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let groups: Vec<GroupResponse> = pool
        .list_groups(path.into_inner())
        .await?
        .into_iter()
        .map(GroupResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(groups))
}

/// Flat tree projection rows for a project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/tree/rows",
    tag = "Groups",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Tree rows", body = Vec<TreeRow>)),
    security(("bearer_auth" = []))
)]
pub async fn get_tree_rows(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let rows = pool.project_tree_rows(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Nested group tree of a project with cases as leaves.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/tree",
    tag = "Groups",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Root groups", body = Vec<GroupNode>)),
    security(("bearer_auth" = []))
)]
pub async fn get_tree(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let rows = pool.project_tree_rows(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(build_tree(rows)))
}

/// Number of cases per group.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/groups/counts",
    tag = "Groups",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses((status = 200, description = "Case counts", body = Vec<GroupCaseCount>)),
    security(("bearer_auth" = []))
)]
pub async fn get_case_counts(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let counts = pool.case_counts_by_group(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(counts))
}

/// Get a group.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Group", body = GroupResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_group(
    _auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let group_id = path.into_inner();
    let group = pool
        .get_group_by_id(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {}", group_id)))?;

    Ok(HttpResponse::Ok().json(GroupResponse::from(group)))
}

/// Edit a group's name and/or description.
#[utoipa::path(
    put,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 400, description = "Nothing to update", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_group(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateGroupRequest>,
) -> AppResult<HttpResponse> {
    auth.require_writer()?;
    let req = body.into_inner();

    let group = pool
        .update_group(path.into_inner(), req.name, req.description)
        .await?;

    Ok(HttpResponse::Ok().json(GroupResponse::from(group)))
}

/// Delete a group together with its subgroups and their cases.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
        (status = 409, description = "A case of the group was captured by a test run", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_group(
    auth: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    pool.delete_group(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure group routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects/{project_id}/groups")
            .route(web::get().to(list_groups))
            .route(web::post().to(create_group)),
    )
    .service(
        web::resource("/projects/{project_id}/groups/counts").route(web::get().to(get_case_counts)),
    )
    .service(web::resource("/projects/{project_id}/tree").route(web::get().to(get_tree)))
    .service(web::resource("/projects/{project_id}/tree/rows").route(web::get().to(get_tree_rows)))
    .service(
        web::resource("/groups/{group_id}")
            .route(web::get().to(get_group))
            .route(web::put().to(update_group))
            .route(web::delete().to(delete_group)),
    )
    .service(web::resource("/groups/{group_id}/subgroups").route(web::post().to(create_subgroup)));
}
