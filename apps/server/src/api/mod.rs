//! API endpoint modules.

pub mod groups;
pub mod health;
pub mod openapi;
pub mod releases;
pub mod reports;
pub mod test_cases;
pub mod test_plans;
pub mod test_runs;
pub mod users;

use actix_web::web;

pub use groups::configure_routes as configure_group_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use releases::configure_routes as configure_release_routes;
pub use reports::configure_report_routes;
pub use test_cases::configure_routes as configure_test_case_routes;
pub use test_plans::configure_routes as configure_plan_routes;
pub use test_runs::configure_routes as configure_run_routes;
pub use users::configure_routes as configure_user_routes;

/// Mount every `/api/v1` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_user_routes)
        .configure(configure_group_routes)
        .configure(configure_test_case_routes)
        .configure(configure_release_routes)
        .configure(configure_plan_routes)
        .configure(configure_run_routes)
        .configure(configure_report_routes);
}
