//! Shared test helpers for E2E tests.

use actix_web::{App, dev::ServiceResponse, test, web};
use sea_orm::ConnectionTrait;
use serde_json::Value;
use tempfile::TempDir;
use testdesk_lib::api;
use testdesk_lib::auth::{SessionKey, issue_token};
use testdesk_lib::db::DbPool;
use testdesk_lib::models::{CreateReleaseRequest, CreateTestCaseRequest, UserRole};
use uuid::Uuid;

/// Session secret used in tests.
pub const TEST_SECRET: &str = "test-secret-for-e2e";

/// Database file that lives as long as the test holds it.
pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

/// Create a fresh migrated database.
pub async fn create_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let pool = DbPool::connect(&url, 1)
        .await
        .expect("Failed to open SQLite database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");

    TestDb { pool, _dir: dir }
}

/// Insert a user and return its id.
pub async fn seed_user(pool: &DbPool, name: &str, role: UserRole) -> Uuid {
    pool.insert_user(name, None, role)
        .await
        .expect("Failed to insert user")
        .id
}

/// Insert a root group and return its id.
pub async fn seed_group(pool: &DbPool, project_id: Uuid, name: &str) -> Uuid {
    pool.insert_group(project_id, name, None)
        .await
        .expect("Failed to insert group")
        .id
}

/// Insert a test case into a group and return its id.
pub async fn seed_case(pool: &DbPool, group_id: Uuid, title: &str) -> Uuid {
    pool.insert_test_case(
        CreateTestCaseRequest {
            group_id,
            title: title.to_string(),
            description: String::new(),
            expected_result: String::new(),
        },
        None,
    )
    .await
    .expect("Failed to insert test case")
    .id
}

/// Insert a release and return its id.
pub async fn seed_release(pool: &DbPool, project_id: Uuid, version: &str) -> Uuid {
    pool.insert_release(
        project_id,
        CreateReleaseRequest {
            version: version.to_string(),
            description: None,
            released_at: None,
        },
    )
    .await
    .expect("Failed to insert release")
    .id
}

/// Create a plan in `release_id` holding `cases` in order.
pub async fn seed_plan(pool: &DbPool, release_id: Uuid, name: &str, cases: &[Uuid]) -> Uuid {
    let plan = pool
        .create_plan_in_release(release_id, name, "", None)
        .await
        .expect("Failed to create plan");
    for case_id in cases {
        pool.add_case_to_plan(plan.id, *case_id)
            .await
            .expect("Failed to add case to plan");
    }
    plan.id
}

/// Make every later insert into `table` fail, so a transaction that reaches
/// that insert has to roll back its earlier writes.
pub async fn refuse_inserts_into(pool: &DbPool, table: &str) {
    let sql = format!(
        "CREATE TRIGGER refuse_{table}_insert BEFORE INSERT ON {table} \
         BEGIN SELECT RAISE(ABORT, 'insert refused'); END;"
    );
    pool.connection()
        .execute_unprepared(&sql)
        .await
        .expect("Failed to create trigger");
}

/// Mint a bearer token for `user_id`.
pub fn token_for(user_id: Uuid, role: UserRole) -> String {
    issue_token(user_id, role, &SessionKey::from(TEST_SECRET), 600).expect("Failed to mint token")
}

/// Create a test app with every API route mounted.
pub async fn create_test_app(
    pool: &DbPool,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(SessionKey::from(TEST_SECRET)))
            .service(web::scope("/api/v1").configure(api::configure_api)),
    )
    .await
}

/// Send a request and return the status with the JSON body (`Null` when empty).
pub async fn call<S>(
    app: &S,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut req = match method {
        "POST" => test::TestRequest::post(),
        "PUT" => test::TestRequest::put(),
        "DELETE" => test::TestRequest::delete(),
        _ => test::TestRequest::get(),
    }
    .uri(uri);

    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {}", token)));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
