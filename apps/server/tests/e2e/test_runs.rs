//! E2E tests: run snapshots, lifecycle, assignment and the run tree.

use sea_orm::EntityTrait;
use testdesk_lib::db::DbPool;
use testdesk_lib::entity::test_run::Entity as TestRun;
use testdesk_lib::error::AppError;
use testdesk_lib::models::{RunCaseStatus, RunTreeFilter, RunTreeQuery, UserRole};
use testdesk_lib::services::build_tree;
use uuid::Uuid;

use super::test_helpers::*;

/// Release with a plan of `titles.len()` cases in one group.
struct Fixture {
    project: Uuid,
    group: Uuid,
    release: Uuid,
    plan: Uuid,
    cases: Vec<Uuid>,
}

async fn fixture(pool: &DbPool, titles: &[&str]) -> Fixture {
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let mut cases = Vec::new();
    for title in titles {
        cases.push(seed_case(pool, group, title).await);
    }
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &cases).await;
    Fixture {
        project,
        group,
        release,
        plan,
        cases,
    }
}

/// A run keeps the cases it started with when the plan changes later.
#[actix_rt::test]
async fn test_run_is_a_snapshot_of_the_plan() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A", "B"]).await;

    let (run, count) = pool.start_run(f.release, f.plan, None).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(run.status, "IN_PROGRESS");

    let late = seed_case(pool, f.group, "Late").await;
    pool.add_case_to_plan(f.plan, late).await.unwrap();
    pool.remove_case_from_plan(f.plan, f.cases[0]).await.unwrap();

    let run_cases = pool.get_run_cases(run.id).await.unwrap();
    let ids: Vec<Uuid> = run_cases.iter().map(|c| c.test_case_id).collect();
    assert_eq!(ids, f.cases);
    assert!(run_cases.iter().all(|c| c.status == "untested"));
}

#[actix_rt::test]
async fn test_start_run_requires_linked_plan() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A"]).await;
    let other_release = seed_release(pool, f.project, "2.0").await;

    let err = pool.start_run(other_release, f.plan, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = pool.start_run(f.release, Uuid::now_v7(), None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_empty_plan_starts_empty_run() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &[]).await;

    let (run, count) = pool.start_run(f.release, f.plan, None).await.unwrap();

    assert_eq!(count, 0);
    assert!(pool.get_run_cases(run.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_finish_run_twice_conflicts() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A"]).await;
    let (run, _) = pool.start_run(f.release, f.plan, None).await.unwrap();

    let finished = pool.finish_run(run.id).await.unwrap();
    assert_eq!(finished.status, "FINISHED");
    assert!(finished.finished_at.is_some());

    let err = pool.finish_run(run.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = pool.finish_run(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_finished_run_rejects_writes() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A"]).await;
    let tester = seed_user(pool, "Tess", UserRole::Tester).await;
    let (run, _) = pool.start_run(f.release, f.plan, None).await.unwrap();
    pool.finish_run(run.id).await.unwrap();

    let err = pool
        .finish_test_case(run.id, f.cases[0], RunCaseStatus::Ok, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = pool.assign_tests(run.id, tester, &f.cases).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = pool.unassign_tests(run.id, &f.cases).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[actix_rt::test]
async fn test_record_outcome() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A", "B"]).await;
    let (run, _) = pool.start_run(f.release, f.plan, None).await.unwrap();

    let updated = pool
        .finish_test_case(
            run.id,
            f.cases[1],
            RunCaseStatus::Nok,
            Some("crashes on submit".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, "NOK");
    assert_eq!(updated.comment.as_deref(), Some("crashes on submit"));
    assert!(updated.executed_at.is_some());

    let err = pool
        .finish_test_case(run.id, f.cases[0], RunCaseStatus::Untested, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = pool
        .finish_test_case(run.id, Uuid::now_v7(), RunCaseStatus::Ok, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_assign_adds_participant_and_rejects_unknown_cases() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A", "B"]).await;
    let tester = seed_user(pool, "Tess", UserRole::Tester).await;
    let (run, _) = pool.start_run(f.release, f.plan, None).await.unwrap();

    let err = pool
        .assign_tests(run.id, tester, &[f.cases[0], Uuid::now_v7()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(
        pool.get_run_cases(run.id)
            .await
            .unwrap()
            .iter()
            .all(|c| c.assigned_to.is_none())
    );

    let err = pool
        .assign_tests(run.id, Uuid::now_v7(), &f.cases)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let assigned = pool.assign_tests(run.id, tester, &[f.cases[0]]).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].assigned_to, Some(tester));

    let users = pool.list_run_users(run.id).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, tester);

    let err = pool.add_user_to_run(run.id, tester).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mine = pool.list_runs_for_user(tester).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].run.id, run.id);

    let cleared = pool.unassign_tests(run.id, &[f.cases[0]]).await.unwrap();
    assert_eq!(cleared[0].assigned_to, None);
}

/// Filtering the run tree drops case leaves but keeps every group.
#[actix_rt::test]
async fn test_run_tree_filter_keeps_structure() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let root = seed_group(pool, project, "Checkout").await;
    let payments = pool.insert_subgroup(root, "Payments", None).await.unwrap().id;
    let search = seed_group(pool, project, "Search").await;
    let unused = seed_group(pool, project, "Unused").await;
    let card = seed_case(pool, payments, "Pay by card").await;
    let query = seed_case(pool, search, "Find by name").await;
    seed_case(pool, unused, "Not planned").await;
    let tester = seed_user(pool, "Tess", UserRole::Tester).await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[card, query]).await;
    let (run, _) = pool.start_run(release, plan, None).await.unwrap();

    pool.finish_test_case(run.id, card, RunCaseStatus::Ok, None)
        .await
        .unwrap();
    pool.assign_tests(run.id, tester, &[query]).await.unwrap();

    let everything = build_tree(
        pool.run_tree_rows(run.id, &RunTreeFilter::default())
            .await
            .unwrap(),
    );
    let roots: Vec<Uuid> = everything.iter().map(|g| g.id).collect();
    assert_eq!(roots, vec![root, search]);
    assert_eq!(everything[0].children[0].cases[0].id, card);
    assert_eq!(everything[1].cases[0].assigned_to_name.as_deref(), Some("Tess"));

    let filter = RunTreeFilter::from_query(&RunTreeQuery {
        assigned_to: None,
        statuses: Some("NOK,BLOCKED".to_string()),
    })
    .unwrap();
    let filtered = build_tree(pool.run_tree_rows(run.id, &filter).await.unwrap());

    let roots: Vec<Uuid> = filtered.iter().map(|g| g.id).collect();
    assert_eq!(roots, vec![root, search]);
    assert_eq!(filtered[0].children.len(), 1);
    assert_eq!(filtered[0].children[0].id, payments);
    assert!(filtered[0].children[0].cases.is_empty());
    assert!(filtered[1].cases.is_empty());

    let mine = RunTreeFilter::from_query(&RunTreeQuery {
        assigned_to: Some(tester.to_string()),
        statuses: None,
    })
    .unwrap();
    let assigned = build_tree(pool.run_tree_rows(run.id, &mine).await.unwrap());
    assert!(assigned[0].children[0].cases.is_empty());
    assert_eq!(assigned[1].cases.len(), 1);
    assert_eq!(assigned[1].cases[0].id, query);
}

/// A finished run keeps every captured case: deleting one of them, or its
/// group, is refused and leaves the library and plan untouched.
#[actix_rt::test]
async fn test_cases_with_run_history_cannot_be_deleted() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A", "B", "C"]).await;
    let (run, _) = pool.start_run(f.release, f.plan, None).await.unwrap();
    pool.finish_test_case(run.id, f.cases[0], RunCaseStatus::Ok, None)
        .await
        .unwrap();
    pool.finish_run(run.id).await.unwrap();
    let before = pool.run_summary(run.id).await.unwrap();

    let err = pool.delete_test_case(f.cases[0]).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = pool.delete_group(f.group).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(pool.run_summary(run.id).await.unwrap(), before);
    assert_eq!(pool.get_run_cases(run.id).await.unwrap().len(), 3);
    assert!(pool.get_group_by_id(f.group).await.unwrap().is_some());
    assert_eq!(pool.get_plan_cases(f.plan).await.unwrap().len(), 3);
}

/// A run whose snapshot insert fails is rolled back with its run row.
#[actix_rt::test]
async fn test_failed_snapshot_leaves_no_run() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let f = fixture(pool, &["A", "B"]).await;

    refuse_inserts_into(pool, "run_cases").await;

    let err = pool.start_run(f.release, f.plan, None).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert!(TestRun::find().all(pool.connection()).await.unwrap().is_empty());
    assert!(pool.list_runs().await.unwrap().is_empty());
}
