//! History store - the bounded, newest-first change log
//!
//! The store owns the in-memory list and its durable mirror. Every mutating
//! operation finishes both its in-memory change and its persistence step before
//! returning, so operations never interleave.

use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use ulid::Generator;

use crate::core::entry::{rollback_action, Actor, ChangeEntry, EntityRef, EntryId};
use crate::core::slot::DurableSlot;
use crate::core::snapshot;

/// Default maximum number of retained entries
pub const DEFAULT_CAPACITY: usize = 100;

/// History store shared between the coordinator and its callers
pub type SharedHistory = Arc<parking_lot::Mutex<HistoryStore>>;

/// Errors from recording changes
#[derive(Debug, Error, miette::Diagnostic)]
pub enum HistoryError {
    #[error("Cannot record change: {field} must not be empty")]
    #[diagnostic(code(freshline::history::empty_field))]
    EmptyField { field: &'static str },

    #[error("Cannot snapshot state: {0}")]
    #[diagnostic(
        code(freshline::history::snapshot),
        help("snapshots must be representable as JSON (string map keys, no cycles)")
    )]
    Snapshot(#[from] serde_json::Error),

    #[error("No signed-in user; refusing to record an anonymous change")]
    #[diagnostic(
        code(freshline::history::unauthenticated),
        help("sign in, or set history.unauthenticated: drop to skip recording")
    )]
    Unauthenticated,
}

/// Which entries a query returns
///
/// Filtering by id alone is not expressible; an id is only meaningful inside
/// its entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryFilter {
    #[default]
    All,
    /// Every entry of one entity type
    Type(String),
    /// Entries of one entity instance
    Entity(String, String),
}

impl HistoryFilter {
    pub fn of_type(entity_type: impl Into<String>) -> Self {
        HistoryFilter::Type(entity_type.into())
    }

    pub fn of_entity(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        HistoryFilter::Entity(entity_type.into(), entity_id.into())
    }

    /// Build from optional parts; an id without a type is ignored
    pub fn from_parts(entity_type: Option<&str>, entity_id: Option<&str>) -> Self {
        match (entity_type, entity_id) {
            (Some(t), Some(id)) => Self::of_entity(t, id),
            (Some(t), None) => Self::of_type(t),
            (None, _) => HistoryFilter::All,
        }
    }

    pub fn matches(&self, entry: &ChangeEntry) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Type(t) => entry.entity_type() == t,
            HistoryFilter::Entity(t, id) => entry.entity_type() == t && entry.entity_id() == id,
        }
    }
}

impl From<&EntityRef> for HistoryFilter {
    fn from(entity: &EntityRef) -> Self {
        HistoryFilter::of_entity(&entity.entity_type, &entity.entity_id)
    }
}

/// Result of consuming an entry for rollback
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackRecord {
    /// The entry being rolled back, as it was recorded
    pub original: ChangeEntry,
    /// Id of the audit entry written for the rollback
    pub audit_id: EntryId,
}

/// Bounded, persisted log of change entries
pub struct HistoryStore {
    /// Newest first
    entries: VecDeque<ChangeEntry>,
    capacity: usize,
    slot: Box<dyn DurableSlot>,
    ids: Generator,
}

impl HistoryStore {
    /// Create an empty store without reading the slot
    ///
    /// A capacity of zero is raised to one.
    pub fn new(slot: Box<dyn DurableSlot>, capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            slot,
            ids: Generator::new(),
        }
    }

    /// Create a store and rehydrate it from the slot
    pub fn open(slot: Box<dyn DurableSlot>, capacity: usize) -> Self {
        let mut store = Self::new(slot, capacity);
        store.load_from_durable_storage();
        store
    }

    /// Wrap the store for sharing
    pub fn into_shared(self) -> SharedHistory {
        Arc::new(parking_lot::Mutex::new(self))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slot_key(&self) -> &str {
        self.slot.key()
    }

    /// Record a change and return the new entry's id
    ///
    /// Nothing is recorded if either snapshot cannot be captured.
    pub fn record_change<P, C>(
        &mut self,
        action: &str,
        entity: &EntityRef,
        previous: &P,
        current: &C,
        actor: &Actor,
    ) -> Result<EntryId, HistoryError>
    where
        P: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        require_non_empty("action", action)?;
        require_non_empty("entity_type", &entity.entity_type)?;
        require_non_empty("entity_id", &entity.entity_id)?;
        require_non_empty("user_id", &actor.id)?;
        require_non_empty("user_name", &actor.name)?;

        let previous = snapshot::capture(previous)?;
        let current = snapshot::capture(current)?;

        let id = self.push(
            action.to_string(),
            entity.clone(),
            previous,
            current,
            actor.clone(),
        );
        debug!(entry = %id, action, entity = %entity, user = %actor.id, "recorded change");
        Ok(id)
    }

    /// All entries matching `filter`, newest first
    pub fn query_history(&self, filter: &HistoryFilter) -> Vec<ChangeEntry> {
        self.entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// Look up an entry by id
    pub fn get(&self, id: &EntryId) -> Option<&ChangeEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Newest entry, if any
    pub fn latest(&self) -> Option<&ChangeEntry> {
        self.entries.front()
    }

    /// Record the rollback of `id` and hand back the original entry
    ///
    /// The audit entry swaps the original's snapshots and is stamped by the
    /// system actor. Unknown ids record nothing.
    pub fn consume_for_rollback(&mut self, id: &EntryId) -> Option<RollbackRecord> {
        let original = self.get(id)?.clone();

        let audit_id = self.push(
            rollback_action(original.action()),
            original.entity(),
            original.current_state().clone(),
            original.previous_state().clone(),
            Actor::system(),
        );
        debug!(entry = %id, audit = %audit_id, "recorded rollback");

        Some(RollbackRecord { original, audit_id })
    }

    /// Remove every entry, or only those of `entity_type`
    ///
    /// Returns how many entries were removed. Always persists.
    pub fn clear_history(&mut self, entity_type: Option<&str>) -> usize {
        let before = self.entries.len();
        match entity_type {
            Some(t) => self.entries.retain(|e| e.entity_type() != t),
            None => self.entries.clear(),
        }
        let removed = before - self.entries.len();
        debug!(scope = entity_type.unwrap_or("*"), removed, "cleared history");
        self.persist();
        removed
    }

    /// Replace the in-memory list with the slot contents
    ///
    /// A missing, unreadable or corrupt slot yields an empty history.
    pub fn load_from_durable_storage(&mut self) {
        self.entries = match self.slot.read() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ChangeEntry>>(&raw) {
                Ok(entries) => entries.into(),
                Err(e) => {
                    warn!(slot = self.slot.key(), error = %e, "discarding corrupt history");
                    VecDeque::new()
                }
            },
            Ok(None) => VecDeque::new(),
            Err(e) => {
                warn!(slot = self.slot.key(), error = %e, "cannot read history, starting empty");
                VecDeque::new()
            }
        };
        if self.entries.len() > self.capacity {
            self.entries.truncate(self.capacity);
        }
        debug!(slot = self.slot.key(), entries = self.entries.len(), "loaded history");
    }

    fn push(
        &mut self,
        action: String,
        entity: EntityRef,
        previous: serde_json::Value,
        current: serde_json::Value,
        actor: Actor,
    ) -> EntryId {
        let id = self.next_id();
        let entry = ChangeEntry::new(id, Utc::now(), action, entity, previous, current, actor);
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.persist();
        id
    }

    fn next_id(&mut self) -> EntryId {
        // The generator only fails once 80 random bits overflow inside one millisecond
        let ulid = self.ids.generate().unwrap_or_else(|_| ulid::Ulid::new());
        EntryId::from_ulid(ulid)
    }

    /// Write the full list to the slot; failures are logged, not raised
    fn persist(&mut self) {
        let entries: Vec<&ChangeEntry> = self.entries.iter().collect();
        let raw = match serde_json::to_string(&entries) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(slot = self.slot.key(), error = %e, "cannot serialize history");
                return;
            }
        };
        if let Err(e) = self.slot.write(&raw) {
            warn!(slot = self.slot.key(), error = %e, "history not persisted; durable copy is stale");
        }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), HistoryError> {
    if value.trim().is_empty() {
        Err(HistoryError::EmptyField { field })
    } else {
        Ok(())
    }
}
