//! Business logic services.

pub mod ordering;
pub mod reporting;
pub mod tree;

pub use reporting::{completion_percentage, summarize};
pub use tree::build_tree;
