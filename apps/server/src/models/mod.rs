//! Domain models and API DTOs for the test management server.

pub mod group;
pub mod plan;
pub mod release;
pub mod report;
pub mod run;
pub mod test_case;
pub mod tree;
pub mod user;

// Re-export commonly used types
pub use group::{CreateGroupRequest, GroupCaseCount, GroupResponse, UpdateGroupRequest};
pub use plan::{
    AddPlanCaseRequest, ClonePlanRequest, ClonePlanResponse, CreatePlanRequest, MoveRequest,
    PlanCaseView, PlanDetailResponse, PlanResponse, PlanWithRelease, RenamePlanRequest,
};
pub use release::{CreateReleaseRequest, ReleaseResponse};
pub use report::{DashboardRun, RunProgress, RunSummary, RunTestRow, UserCount, UNASSIGNED_LABEL};
pub use run::{
    AddRunUserRequest, AssigneeFilter, AssignTestsRequest, FinishTestCaseRequest, RunCaseResponse,
    RunCaseStatus, RunListItem, RunResponse, RunStatus, RunTreeFilter, RunTreeQuery,
    StartRunResponse, UnassignTestsRequest,
};
pub use test_case::{
    CreateTestCaseRequest, CreateTestPointRequest, TestCaseListItem, TestCaseResponse,
    TestCaseStatus, TestPointResponse, UpdateTestCaseRequest, UpdateTestPointRequest,
};
pub use tree::{CaseLeaf, GroupNode, TreeRow};
pub use user::{CreateUserRequest, SessionClaims, UserResponse, UserRole};
