//! Core module - change history, rollback and their storage

pub mod config;
pub mod entry;
pub mod history;
pub mod identity;
pub mod rollback;
pub mod shortid;
pub mod slot;
pub mod snapshot;

pub use config::{Config, HistoryConfig, SlotBackend, UserConfig};
pub use entry::{Actor, ChangeEntry, EntityRef, EntryId, EntryIdError};
pub use history::{
    HistoryError, HistoryFilter, HistoryStore, RollbackRecord, SharedHistory, DEFAULT_CAPACITY,
};
pub use identity::{IdentityProvider, Session};
pub use rollback::{RollbackCoordinator, RollbackOutcome, UnauthenticatedPolicy};
pub use shortid::ShortIdIndex;
pub use slot::{DurableSlot, FileSlot, MemorySlot, SlotError, SqliteSlot, DEFAULT_SLOT_KEY};
