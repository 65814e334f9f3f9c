//! E2E tests: run summaries, per-user counts and the dashboard.

use testdesk_lib::models::{RunCaseStatus, UNASSIGNED_LABEL, UserRole};
use testdesk_lib::services::completion_percentage;
use uuid::Uuid;

use super::test_helpers::*;

/// 2 OK, 1 NOK, 1 BLOCKED and 4 untested cases are 50% complete.
#[actix_rt::test]
async fn test_summary_and_progress() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let mut cases = Vec::new();
    for n in 1..=8 {
        cases.push(seed_case(pool, group, &format!("Case {}", n)).await);
    }
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Full", &cases).await;
    let (run, _) = pool.start_run(release, plan, None).await.unwrap();

    let outcomes = [
        RunCaseStatus::Ok,
        RunCaseStatus::Ok,
        RunCaseStatus::Nok,
        RunCaseStatus::Blocked,
    ];
    for (case, status) in cases.iter().zip(outcomes) {
        pool.finish_test_case(run.id, *case, status, None)
            .await
            .unwrap();
    }

    let summary = pool.run_summary(run.id).await.unwrap();
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.nok, 1);
    assert_eq!(summary.blocked, 1);
    assert_eq!(summary.untested, 4);
    assert_eq!(summary.total, 8);
    assert_eq!(completion_percentage(&summary), 50);

    let detail = pool.get_run_detail(run.id).await.unwrap();
    assert_eq!(detail.progress, 50);
    assert_eq!(detail.plan_name.as_deref(), Some("Full"));
    assert_eq!(detail.release_version, "1.0");
}

#[actix_rt::test]
async fn test_counts_by_user_include_unassigned() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let mut cases = Vec::new();
    for title in ["Zeta", "Alpha", "Mid"] {
        cases.push(seed_case(pool, group, title).await);
    }
    let tess = seed_user(pool, "Tess", UserRole::Tester).await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &cases).await;
    let (run, _) = pool.start_run(release, plan, None).await.unwrap();
    pool.assign_tests(run.id, tess, &cases[..2]).await.unwrap();

    let counts = pool.run_by_user(run.id).await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].user, "Tess");
    assert_eq!(counts[0].user_id, Some(tess));
    assert_eq!(counts[0].count, 2);
    assert_eq!(counts[1].user, UNASSIGNED_LABEL);
    assert_eq!(counts[1].count, 1);

    let rows = pool.run_test_list(run.id).await.unwrap();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Mid", "Zeta"]);
    assert_eq!(rows[0].assigned_to, "Tess");
    assert_eq!(rows[1].assigned_to, UNASSIGNED_LABEL);
    assert!(rows.iter().all(|r| r.status == "untested"));
}

#[actix_rt::test]
async fn test_dashboard_lists_only_active_runs() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let case = seed_case(pool, group, "A").await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[case]).await;

    let (done, _) = pool.start_run(release, plan, None).await.unwrap();
    pool.finish_run(done.id).await.unwrap();
    let (active, _) = pool.start_run(release, plan, None).await.unwrap();
    pool.finish_test_case(active.id, case, RunCaseStatus::Ok, None)
        .await
        .unwrap();

    let dashboard = pool.dashboard().await.unwrap();

    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0].run_id, active.id);
    assert_eq!(dashboard[0].progress, 100);
    assert_eq!(dashboard[0].summary.ok, 1);
}

#[actix_rt::test]
async fn test_reports_for_unknown_run_are_not_found() {
    let db = create_test_db().await;

    let err = db.pool.run_summary(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, testdesk_lib::error::AppError::NotFound(_)));
}
