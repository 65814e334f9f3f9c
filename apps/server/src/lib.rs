//! Testdesk server library.
//!
//! Test case library, release plans, test runs and their reports,
//! exposed over a bearer-authenticated JSON API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
