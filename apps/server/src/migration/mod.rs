//! SeaORM database migrations.
//!
//! Built with the schema builder so the same migrations run on PostgreSQL
//! in production and SQLite in tests.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_test_groups;
mod m20260301_000003_create_test_cases;
mod m20260301_000004_create_test_points;
mod m20260301_000005_create_releases;
mod m20260301_000006_create_test_plans;
mod m20260301_000007_create_release_plans;
mod m20260301_000008_create_plan_cases;
mod m20260301_000009_create_test_runs;
mod m20260301_000010_create_run_cases;
mod m20260301_000011_create_run_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_test_groups::Migration),
            Box::new(m20260301_000003_create_test_cases::Migration),
            Box::new(m20260301_000004_create_test_points::Migration),
            Box::new(m20260301_000005_create_releases::Migration),
            Box::new(m20260301_000006_create_test_plans::Migration),
            Box::new(m20260301_000007_create_release_plans::Migration),
            Box::new(m20260301_000008_create_plan_cases::Migration),
            Box::new(m20260301_000009_create_test_runs::Migration),
            Box::new(m20260301_000010_create_run_cases::Migration),
            Box::new(m20260301_000011_create_run_users::Migration),
        ]
    }
}
