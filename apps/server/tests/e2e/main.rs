//! End-to-end test suite.
//!
//! Every test runs against its own SQLite database file with all
//! migrations applied; no external services are needed.
//!
//! Run with: cargo test --test e2e

mod test_helpers;

mod test_authz;
mod test_library;
mod test_plans;
mod test_reports;
mod test_runs;
