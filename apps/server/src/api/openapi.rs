//! OpenAPI documentation configuration.

use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Testdesk Server",
        version = "0.1.0",
        description = "Manual test management: test case library, release plans, test runs and progress reports"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        api::health::info,
        // Users
        api::users::create_user,
        api::users::list_users,
        api::users::get_user,
        api::users::list_user_runs,
        // Groups and tree
        api::groups::create_group,
        api::groups::create_subgroup,
        api::groups::list_groups,
        api::groups::get_tree,
        api::groups::get_tree_rows,
        api::groups::get_case_counts,
        api::groups::get_group,
        api::groups::update_group,
        api::groups::delete_group,
        // Test cases and points
        api::test_cases::create_test_case,
        api::test_cases::list_test_cases,
        api::test_cases::get_test_case,
        api::test_cases::update_test_case,
        api::test_cases::delete_test_case,
        api::test_cases::list_test_points,
        api::test_cases::create_test_point,
        api::test_cases::update_test_point,
        api::test_cases::move_test_point,
        api::test_cases::delete_test_point,
        // Releases
        api::releases::create_release,
        api::releases::list_releases,
        api::releases::get_release,
        api::releases::delete_release,
        // Plans
        api::test_plans::create_plan,
        api::test_plans::list_release_plans,
        api::test_plans::list_project_plans,
        api::test_plans::get_plan,
        api::test_plans::rename_plan,
        api::test_plans::delete_plan,
        api::test_plans::clone_plan,
        api::test_plans::add_plan_case,
        api::test_plans::remove_plan_case,
        api::test_plans::move_plan_case,
        // Runs
        api::test_runs::start_run,
        api::test_runs::list_runs,
        api::test_runs::get_run,
        api::test_runs::finish_run,
        api::test_runs::list_run_cases,
        api::test_runs::list_run_users,
        api::test_runs::add_run_user,
        api::test_runs::assign_tests,
        api::test_runs::unassign_tests,
        api::test_runs::finish_test_case,
        api::test_runs::get_run_tree,
        // Reports
        api::reports::get_run_summary,
        api::reports::get_run_by_user,
        api::reports::get_run_tests,
        api::reports::get_dashboard,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            api::health::ServerInfoResponse,
            // Users
            models::UserRole,
            models::CreateUserRequest,
            models::UserResponse,
            // Groups and tree
            models::CreateGroupRequest,
            models::UpdateGroupRequest,
            models::GroupResponse,
            models::GroupCaseCount,
            models::TreeRow,
            models::GroupNode,
            models::CaseLeaf,
            // Test cases
            models::TestCaseStatus,
            models::CreateTestCaseRequest,
            models::UpdateTestCaseRequest,
            models::TestCaseResponse,
            models::TestCaseListItem,
            models::CreateTestPointRequest,
            models::UpdateTestPointRequest,
            models::TestPointResponse,
            // Releases
            models::CreateReleaseRequest,
            models::ReleaseResponse,
            // Plans
            models::CreatePlanRequest,
            models::RenamePlanRequest,
            models::ClonePlanRequest,
            models::ClonePlanResponse,
            models::AddPlanCaseRequest,
            models::MoveRequest,
            models::PlanResponse,
            models::PlanWithRelease,
            models::PlanCaseView,
            models::PlanDetailResponse,
            // Runs
            models::RunStatus,
            models::RunCaseStatus,
            models::AddRunUserRequest,
            models::AssignTestsRequest,
            models::UnassignTestsRequest,
            models::FinishTestCaseRequest,
            models::RunResponse,
            models::StartRunResponse,
            models::RunListItem,
            models::RunCaseResponse,
            // Reports
            models::RunSummary,
            models::RunProgress,
            models::UserCount,
            models::RunTestRow,
            models::DashboardRun,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Users", description = "User accounts and roles"),
        (name = "Groups", description = "Test groups and the project tree"),
        (name = "Test Cases", description = "Test cases and their ordered steps"),
        (name = "Releases", description = "Product releases"),
        (name = "Test Plans", description = "Ordered selections of test cases"),
        (name = "Test Runs", description = "Run execution, assignment and outcomes"),
        (name = "Reports", description = "Run summaries and the active-run dashboard")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_bearer_scheme_and_run_paths() {
        let doc = ApiDoc::openapi();

        let components = doc.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/api/v1/runs/{run_id}/tree"));
        assert!(doc.paths.paths.contains_key("/api/v1/plans/{plan_id}/clone"));
    }
}
