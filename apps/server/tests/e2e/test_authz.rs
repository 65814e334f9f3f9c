//! E2E tests over HTTP: authentication, role gates and a full run workflow.

use serde_json::json;
use testdesk_lib::models::UserRole;
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_health_needs_no_token() {
    let db = create_test_db().await;
    let app = create_test_app(&db.pool).await;

    let (status, body) = call(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app, "GET", "/api/v1/ready", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
}

#[actix_rt::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let db = create_test_db().await;
    let app = create_test_app(&db.pool).await;

    let (status, body) = call(&app, "GET", "/api/v1/runs", None, None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = call(&app, "GET", "/api/v1/runs", Some("not-a-jwt"), None).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_role_gates() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let app = create_test_app(pool).await;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;

    let viewer = token_for(seed_user(pool, "Vic", UserRole::Viewer).await, UserRole::Viewer);
    let tester = token_for(seed_user(pool, "Tess", UserRole::Tester).await, UserRole::Tester);
    let admin = token_for(seed_user(pool, "Ada", UserRole::Admin).await, UserRole::Admin);
    let groups_uri = format!("/api/v1/projects/{}/groups", project);
    let group_uri = format!("/api/v1/groups/{}", group);

    // Viewers read but never write
    let (status, _) = call(&app, "GET", &groups_uri, Some(&viewer), None).await;
    assert_eq!(status, 200);
    let (status, body) = call(
        &app,
        "POST",
        &groups_uri,
        Some(&viewer),
        Some(json!({ "name": "Nope" })),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "FORBIDDEN");

    // Testers write but do not delete
    let (status, _) = call(
        &app,
        "POST",
        &groups_uri,
        Some(&tester),
        Some(json!({ "name": "Search" })),
    )
    .await;
    assert_eq!(status, 201);
    let (status, _) = call(&app, "DELETE", &group_uri, Some(&tester), None).await;
    assert_eq!(status, 403);

    // Only admins create users
    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/users",
        Some(&tester),
        Some(json!({ "name": "Eve" })),
    )
    .await;
    assert_eq!(status, 403);
    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/users",
        Some(&admin),
        Some(json!({ "name": "Eve", "role": "viewer" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["role"], "viewer");

    let (status, _) = call(&app, "DELETE", &group_uri, Some(&admin), None).await;
    assert_eq!(status, 204);
    let (status, _) = call(&app, "GET", &group_uri, Some(&admin), None).await;
    assert_eq!(status, 404);
}

/// Build a plan, run it, record outcomes and read the reports over HTTP.
#[actix_rt::test]
async fn test_run_workflow() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let app = create_test_app(pool).await;
    let project = Uuid::now_v7();
    let tester_id = seed_user(pool, "Tess", UserRole::Tester).await;
    let tester = token_for(tester_id, UserRole::Tester);
    let token = Some(tester.as_str());

    let (status, group) = call(
        &app,
        "POST",
        &format!("/api/v1/projects/{}/groups", project),
        token,
        Some(json!({ "name": "Checkout" })),
    )
    .await;
    assert_eq!(status, 201);
    let group_id = group["id"].as_str().unwrap().to_string();

    let mut case_ids = Vec::new();
    for title in ["Pay by card", "Pay by invoice"] {
        let (status, case) = call(
            &app,
            "POST",
            "/api/v1/test-cases",
            token,
            Some(json!({ "group_id": group_id, "title": title })),
        )
        .await;
        assert_eq!(status, 201);
        case_ids.push(case["id"].as_str().unwrap().to_string());
    }

    let (status, release) = call(
        &app,
        "POST",
        &format!("/api/v1/projects/{}/releases", project),
        token,
        Some(json!({ "version": "2.4.0" })),
    )
    .await;
    assert_eq!(status, 201);
    let release_id = release["id"].as_str().unwrap().to_string();

    let (status, plan) = call(
        &app,
        "POST",
        &format!("/api/v1/releases/{}/plans", release_id),
        token,
        Some(json!({ "name": "Checkout regression" })),
    )
    .await;
    assert_eq!(status, 201);
    let plan_id = plan["id"].as_str().unwrap().to_string();

    for case_id in &case_ids {
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/plans/{}/cases", plan_id),
            token,
            Some(json!({ "test_case_id": case_id })),
        )
        .await;
        assert_eq!(status, 201);
    }
    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/v1/plans/{}/cases", plan_id),
        token,
        Some(json!({ "test_case_id": case_ids[0] })),
    )
    .await;
    assert_eq!(status, 409);

    let (status, started) = call(
        &app,
        "POST",
        &format!("/api/v1/releases/{}/plans/{}/runs", release_id, plan_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(started["case_count"], 2);
    let run_id = started["run"]["id"].as_str().unwrap().to_string();
    let results_uri = format!("/api/v1/runs/{}/results", run_id);

    let (status, _) = call(
        &app,
        "POST",
        &results_uri,
        token,
        Some(json!({ "test_case_id": case_ids[0], "status": "untested" })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, recorded) = call(
        &app,
        "POST",
        &results_uri,
        token,
        Some(json!({ "test_case_id": case_ids[0], "status": "OK" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(recorded["status"], "OK");

    let (status, summary) = call(
        &app,
        "GET",
        &format!("/api/v1/runs/{}/summary", run_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(summary["OK"], 1);
    assert_eq!(summary["untested"], 1);
    assert_eq!(summary["progress"], 50);

    let (status, _) = call(
        &app,
        "GET",
        &format!("/api/v1/runs/{}/tree?statuses=BOGUS", run_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, 400);

    let (status, tree) = call(
        &app,
        "GET",
        &format!("/api/v1/runs/{}/tree?statuses=OK", run_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(tree[0]["cases"].as_array().unwrap().len(), 1);

    let finish_uri = format!("/api/v1/runs/{}/finish", run_id);
    let (status, finished) = call(&app, "POST", &finish_uri, token, None).await;
    assert_eq!(status, 200);
    assert_eq!(finished["status"], "FINISHED");

    let (status, body) = call(&app, "POST", &finish_uri, token, None).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    let (status, _) = call(
        &app,
        "POST",
        &results_uri,
        token,
        Some(json!({ "test_case_id": case_ids[1], "status": "NOK" })),
    )
    .await;
    assert_eq!(status, 409);

    let (status, dashboard) = call(&app, "GET", "/api/v1/dashboard", token, None).await;
    assert_eq!(status, 200);
    assert!(dashboard.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_unknown_run_is_not_found() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let app = create_test_app(pool).await;
    let token = token_for(seed_user(pool, "Vic", UserRole::Viewer).await, UserRole::Viewer);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/v1/runs/{}", Uuid::now_v7()),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}
