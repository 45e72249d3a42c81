//! Freshline: auditable state history and rollback
//!
//! Records before/after snapshots of console entities (products, lots,
//! labels, campaigns) in a bounded, persisted log and undoes recorded changes
//! by replaying their earlier snapshot, itself recorded as a new entry.

pub mod cli;
pub mod core;
pub mod logging;
