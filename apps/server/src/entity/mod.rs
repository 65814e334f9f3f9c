//! SeaORM entity definitions for the test management database.

pub mod plan_case;
pub mod release;
pub mod release_plan;
pub mod run_case;
pub mod run_user;
pub mod test_case;
pub mod test_group;
pub mod test_plan;
pub mod test_point;
pub mod test_run;
pub mod user;
