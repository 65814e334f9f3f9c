//! E2E tests: plan membership, ordering and cloning.

use sea_orm::EntityTrait;
use testdesk_lib::entity::release_plan::Entity as ReleasePlan;
use testdesk_lib::entity::test_plan::Entity as TestPlan;
use testdesk_lib::error::AppError;
use uuid::Uuid;

use super::test_helpers::*;

async fn case_order(pool: &testdesk_lib::db::DbPool, plan_id: Uuid) -> Vec<(Uuid, i32)> {
    pool.get_plan_cases(plan_id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.test_case_id, c.position))
        .collect()
}

#[actix_rt::test]
async fn test_added_cases_get_contiguous_positions() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let b = seed_case(pool, group, "B").await;
    let c = seed_case(pool, group, "C").await;
    let release = seed_release(pool, project, "1.0").await;

    let plan = seed_plan(pool, release, "Smoke", &[c, a, b]).await;

    assert_eq!(case_order(pool, plan).await, vec![(c, 1), (a, 2), (b, 3)]);

    let detail = pool.get_plan_cases(plan).await.unwrap();
    assert_eq!(detail[0].title, "C");
    assert_eq!(detail[0].group_name.as_deref(), Some("Root"));
}

#[actix_rt::test]
async fn test_adding_a_case_twice_conflicts() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[a]).await;

    let err = pool.add_case_to_plan(plan, a).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(case_order(pool, plan).await, vec![(a, 1)]);
}

#[actix_rt::test]
async fn test_case_from_another_project_is_rejected() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let foreign_group = seed_group(pool, Uuid::now_v7(), "Other").await;
    let foreign_case = seed_case(pool, foreign_group, "Elsewhere").await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[]).await;

    let err = pool.add_case_to_plan(plan, foreign_case).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

/// Removing the second of four cases leaves positions 1, 2, 3 in the old order.
#[actix_rt::test]
async fn test_remove_renumbers_remaining_cases() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let mut cases = Vec::new();
    for title in ["A", "B", "C", "D"] {
        cases.push(seed_case(pool, group, title).await);
    }
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Regression", &cases).await;

    pool.remove_case_from_plan(plan, cases[1]).await.unwrap();

    assert_eq!(
        case_order(pool, plan).await,
        vec![(cases[0], 1), (cases[2], 2), (cases[3], 3)]
    );

    let err = pool.remove_case_from_plan(plan, cases[1]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_move_case_within_plan() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let b = seed_case(pool, group, "B").await;
    let c = seed_case(pool, group, "C").await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[a, b, c]).await;

    let moved = pool.move_case_in_plan(plan, c, 1).await.unwrap();
    let order: Vec<(Uuid, i32)> = moved.iter().map(|v| (v.test_case_id, v.position)).collect();
    assert_eq!(order, vec![(c, 1), (a, 2), (b, 3)]);

    let err = pool.move_case_in_plan(plan, a, 0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

/// A clone is an independent copy: later edits to the source leave it alone.
#[actix_rt::test]
async fn test_clone_copies_cases_and_stays_independent() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let b = seed_case(pool, group, "B").await;
    let c = seed_case(pool, group, "C").await;
    let v1 = seed_release(pool, project, "1.0").await;
    let v2 = seed_release(pool, project, "2.0").await;
    let source = seed_plan(pool, v1, "Smoke", &[b, a, c]).await;

    let (copy, ids) = pool.clone_plan(source, v2, None).await.unwrap();

    assert_ne!(copy.id, source);
    assert_eq!(copy.name, "Smoke (Copy)");
    assert_eq!(ids, vec![b, a, c]);

    pool.remove_case_from_plan(source, a).await.unwrap();
    pool.rename_plan(source, "Smoke v1").await.unwrap();

    assert_eq!(case_order(pool, copy.id).await, vec![(b, 1), (a, 2), (c, 3)]);
    let copy_after = pool.get_plan_by_id(copy.id).await.unwrap().unwrap();
    assert_eq!(copy_after.name, "Smoke (Copy)");

    let in_v2: Vec<Uuid> = pool
        .list_plans_for_release(v2)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(in_v2, vec![copy.id]);
}

#[actix_rt::test]
async fn test_clone_into_foreign_release_is_rejected() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let release = seed_release(pool, project, "1.0").await;
    let foreign = seed_release(pool, Uuid::now_v7(), "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[]).await;

    let err = pool.clone_plan(plan, foreign, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn test_rename_rejects_blank_name() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let release = seed_release(pool, Uuid::now_v7(), "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[]).await;

    let err = pool.rename_plan(plan, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn test_delete_plan_removes_links_and_entries() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Smoke", &[a]).await;

    pool.delete_plan(plan).await.unwrap();

    assert!(pool.get_plan_by_id(plan).await.unwrap().is_none());
    assert!(pool.get_plan_cases(plan).await.unwrap().is_empty());
    assert!(pool.list_plans_for_release(release).await.unwrap().is_empty());
    assert!(pool.get_test_case_by_id(a).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_duplicate_release_version_conflicts() {
    let db = create_test_db().await;
    let project = Uuid::now_v7();
    seed_release(&db.pool, project, "1.0").await;

    let err = db
        .pool
        .insert_release(
            project,
            testdesk_lib::models::CreateReleaseRequest {
                version: "1.0".to_string(),
                description: None,
                released_at: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

/// Two removals of distinct cases back to back, then an append: positions stay 1..N.
#[actix_rt::test]
async fn test_back_to_back_removals_keep_positions_dense() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let mut cases = Vec::new();
    for title in ["A", "B", "C", "D", "E"] {
        cases.push(seed_case(pool, group, title).await);
    }
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Regression", &cases).await;

    let (first, second) = tokio::join!(
        pool.remove_case_from_plan(plan, cases[1]),
        pool.remove_case_from_plan(plan, cases[3]),
    );
    first.unwrap();
    second.unwrap();

    let late = seed_case(pool, group, "Late").await;
    pool.add_case_to_plan(plan, late).await.unwrap();

    let order = case_order(pool, plan).await;
    let positions: Vec<i32> = order.iter().map(|(_, p)| *p).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
    let ids: Vec<Uuid> = order.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![cases[0], cases[2], cases[4], late]);
}

/// Deleting a test case closes its gap in every plan holding it.
#[actix_rt::test]
async fn test_deleting_a_case_renumbers_its_plans() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let b = seed_case(pool, group, "B").await;
    let c = seed_case(pool, group, "C").await;
    let release = seed_release(pool, project, "1.0").await;
    let smoke = seed_plan(pool, release, "Smoke", &[a, b, c]).await;
    let quick = seed_plan(pool, release, "Quick", &[b, a]).await;

    pool.delete_test_case(b).await.unwrap();

    assert_eq!(case_order(pool, smoke).await, vec![(a, 1), (c, 2)]);
    assert_eq!(case_order(pool, quick).await, vec![(a, 1)]);

    let d = seed_case(pool, group, "D").await;
    pool.add_case_to_plan(smoke, d).await.unwrap();
    assert_eq!(case_order(pool, smoke).await, vec![(a, 1), (c, 2), (d, 3)]);
}

/// Deleting a group drops the cases of its whole subtree from plans and
/// renumbers what is left.
#[actix_rt::test]
async fn test_deleting_a_group_renumbers_plans() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let root = seed_group(pool, project, "Checkout").await;
    let child = pool.insert_subgroup(root, "Payment", None).await.unwrap().id;
    let grandchild = pool.insert_subgroup(child, "Cards", None).await.unwrap().id;
    let other = seed_group(pool, project, "Search").await;

    let a = seed_case(pool, root, "A").await;
    let b = seed_case(pool, child, "B").await;
    let c = seed_case(pool, other, "C").await;
    let d = seed_case(pool, grandchild, "D").await;
    let release = seed_release(pool, project, "1.0").await;
    let plan = seed_plan(pool, release, "Full", &[a, c, b, d]).await;

    pool.delete_group(root).await.unwrap();

    assert_eq!(case_order(pool, plan).await, vec![(c, 1)]);

    let e = seed_case(pool, other, "E").await;
    pool.add_case_to_plan(plan, e).await.unwrap();
    assert_eq!(case_order(pool, plan).await, vec![(c, 1), (e, 2)]);
}

/// A clone that fails while copying cases leaves no plan and no link behind.
#[actix_rt::test]
async fn test_failed_clone_rolls_back() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();
    let group = seed_group(pool, project, "Root").await;
    let a = seed_case(pool, group, "A").await;
    let b = seed_case(pool, group, "B").await;
    let v1 = seed_release(pool, project, "1.0").await;
    let v2 = seed_release(pool, project, "2.0").await;
    let source = seed_plan(pool, v1, "Smoke", &[a, b]).await;

    refuse_inserts_into(pool, "plan_cases").await;

    let err = pool.clone_plan(source, v2, None).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let plans = TestPlan::find().all(pool.connection()).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].id, source);
    let links = ReleasePlan::find().all(pool.connection()).await.unwrap();
    assert_eq!(links.len(), 1);
    assert!(pool.list_plans_for_release(v2).await.unwrap().is_empty());
    assert_eq!(case_order(pool, source).await, vec![(a, 1), (b, 2)]);
}
