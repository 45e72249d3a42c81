//! CLI command implementations

pub mod clear;
pub mod completions;
pub mod history;
pub mod record;
pub mod rollback;
pub mod show;
