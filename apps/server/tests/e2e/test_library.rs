//! E2E tests: groups, test cases and test points.

use testdesk_lib::error::AppError;
use testdesk_lib::models::UpdateTestCaseRequest;
use testdesk_lib::services::build_tree;
use uuid::Uuid;

use super::test_helpers::*;

/// Deleting a root group removes every descendant group and case.
#[actix_rt::test]
async fn test_group_delete_cascades_three_levels() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();

    let root = seed_group(pool, project, "Checkout").await;
    let child = pool
        .insert_subgroup(root, "Payments", None)
        .await
        .unwrap()
        .id;
    let grandchild = pool.insert_subgroup(child, "Cards", None).await.unwrap().id;
    let cases = [
        seed_case(pool, root, "Cart totals").await,
        seed_case(pool, child, "Pay by invoice").await,
        seed_case(pool, grandchild, "Expired card").await,
    ];
    let point = pool
        .insert_test_point(cases[2], "Enter card 4000 0000 0000 0069", None)
        .await
        .unwrap();
    let untouched = seed_group(pool, project, "Search").await;

    pool.delete_group(root).await.unwrap();

    for id in [root, child, grandchild] {
        assert!(pool.get_group_by_id(id).await.unwrap().is_none());
    }
    for id in cases {
        assert!(pool.get_test_case_by_id(id).await.unwrap().is_none());
    }
    assert!(pool.list_test_points(point.test_case_id).await.unwrap().is_empty());

    let remaining: Vec<Uuid> = pool
        .list_groups(project)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(remaining, vec![untouched]);
}

#[actix_rt::test]
async fn test_delete_unknown_group_is_not_found() {
    let db = create_test_db().await;

    let err = db.pool.delete_group(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_subgroup_inherits_project() {
    let db = create_test_db().await;
    let project = Uuid::now_v7();
    let root = seed_group(&db.pool, project, "Root").await;

    let child = db.pool.insert_subgroup(root, "Child", None).await.unwrap();

    assert_eq!(child.project_id, project);
    assert_eq!(child.parent_id, Some(root));
}

#[actix_rt::test]
async fn test_update_group_requires_a_field() {
    let db = create_test_db().await;
    let group = seed_group(&db.pool, Uuid::now_v7(), "Root").await;

    let err = db.pool.update_group(group, None, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let renamed = db
        .pool
        .update_group(group, Some("Renamed".to_string()), None)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Renamed");
}

#[actix_rt::test]
async fn test_case_cannot_move_to_another_project() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let home = seed_group(pool, Uuid::now_v7(), "Home").await;
    let foreign = seed_group(pool, Uuid::now_v7(), "Foreign").await;
    let case = seed_case(pool, home, "Login").await;

    let err = pool
        .update_test_case(
            case,
            UpdateTestCaseRequest {
                group_id: Some(foreign),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn test_new_case_starts_as_draft() {
    let db = create_test_db().await;
    let group = seed_group(&db.pool, Uuid::now_v7(), "Root").await;
    let case = seed_case(&db.pool, group, "Login").await;

    let stored = db.pool.get_test_case_by_id(case).await.unwrap().unwrap();
    assert_eq!(stored.status, "draft");
}

/// Removing the second of four points renumbers the rest to 1, 2, 3.
#[actix_rt::test]
async fn test_point_positions_stay_contiguous() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let group = seed_group(pool, Uuid::now_v7(), "Root").await;
    let case = seed_case(pool, group, "Login").await;

    let mut ids = Vec::new();
    for step in ["Open page", "Type user", "Type password", "Submit"] {
        ids.push(pool.insert_test_point(case, step, None).await.unwrap().id);
    }

    pool.delete_test_point(ids[1]).await.unwrap();

    let points = pool.list_test_points(case).await.unwrap();
    let positions: Vec<i32> = points.iter().map(|p| p.position).collect();
    let order: Vec<Uuid> = points.iter().map(|p| p.id).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    assert_eq!(order, vec![ids[0], ids[2], ids[3]]);
}

#[actix_rt::test]
async fn test_point_insert_and_move() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let group = seed_group(pool, Uuid::now_v7(), "Root").await;
    let case = seed_case(pool, group, "Login").await;

    let a = pool.insert_test_point(case, "A", None).await.unwrap().id;
    let b = pool.insert_test_point(case, "B", None).await.unwrap().id;
    let front = pool.insert_test_point(case, "Front", Some(1)).await.unwrap().id;

    let order: Vec<Uuid> = pool
        .list_test_points(case)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(order, vec![front, a, b]);

    let moved = pool.move_test_point(front, 3).await.unwrap();
    let order: Vec<(Uuid, i32)> = moved.iter().map(|p| (p.id, p.position)).collect();
    assert_eq!(order, vec![(a, 1), (b, 2), (front, 3)]);

    let err = pool.move_test_point(a, 4).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn test_project_tree_nests_groups_and_cases() {
    let db = create_test_db().await;
    let pool = &db.pool;
    let project = Uuid::now_v7();

    let root = seed_group(pool, project, "Checkout").await;
    let child = pool.insert_subgroup(root, "Payments", None).await.unwrap().id;
    let empty = seed_group(pool, project, "Empty").await;
    let case = seed_case(pool, child, "Pay by card").await;

    let tree = build_tree(pool.project_tree_rows(project).await.unwrap());

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].id, root);
    assert!(tree[0].cases.is_empty());
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].id, child);
    assert_eq!(tree[0].children[0].cases[0].id, case);
    assert_eq!(tree[1].id, empty);
    assert!(tree[1].children.is_empty());

    let counts = pool.case_counts_by_group(project).await.unwrap();
    let child_count = counts.iter().find(|c| c.group_id == child).unwrap();
    assert_eq!(child_count.total_cases, 1);
    assert!(counts.iter().any(|c| c.group_id == empty && c.total_cases == 0));
}
