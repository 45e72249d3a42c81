//! Rollback coordinator - the application's only door into the history
//!
//! Binds the history store to the signed-in actor and to the caller's restore
//! callbacks. A rollback first records its audit entry and only then hands the
//! earlier snapshot to the callback; a failing callback does not remove the
//! audit entry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::entry::{ChangeEntry, EntityRef, EntryId};
use crate::core::history::{HistoryError, HistoryFilter, RollbackRecord, SharedHistory};
use crate::core::identity::IdentityProvider;
use crate::core::snapshot;

/// What `save_state` does when nobody is signed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnauthenticatedPolicy {
    /// Skip recording and report `Ok(None)`
    #[default]
    Drop,
    /// Fail with `HistoryError::Unauthenticated`
    Reject,
}

impl fmt::Display for UnauthenticatedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthenticatedPolicy::Drop => write!(f, "drop"),
            UnauthenticatedPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// How a rollback ended
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackOutcome {
    /// Snapshot restored and audit entry recorded
    Completed {
        original: ChangeEntry,
        audit_id: EntryId,
    },
    /// No entry with that id; nothing recorded
    NotFound,
    /// Audit entry recorded but the restore callback failed
    RestoreFailed {
        original: ChangeEntry,
        audit_id: EntryId,
        reason: String,
    },
}

impl RollbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RollbackOutcome::Completed { .. })
    }

    /// Id of the audit entry, if one was recorded
    pub fn audit_id(&self) -> Option<&EntryId> {
        match self {
            RollbackOutcome::Completed { audit_id, .. }
            | RollbackOutcome::RestoreFailed { audit_id, .. } => Some(audit_id),
            RollbackOutcome::NotFound => None,
        }
    }

    /// The entry that was rolled back, if it existed
    pub fn original(&self) -> Option<&ChangeEntry> {
        match self {
            RollbackOutcome::Completed { original, .. }
            | RollbackOutcome::RestoreFailed { original, .. } => Some(original),
            RollbackOutcome::NotFound => None,
        }
    }
}

/// Facade over the history store for application code
#[derive(Clone)]
pub struct RollbackCoordinator {
    history: SharedHistory,
    identity: Arc<dyn IdentityProvider>,
    policy: UnauthenticatedPolicy,
}

impl RollbackCoordinator {
    pub fn new(history: SharedHistory, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            history,
            identity,
            policy: UnauthenticatedPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnauthenticatedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnauthenticatedPolicy {
        self.policy
    }

    /// Record a change on behalf of the signed-in actor
    ///
    /// Returns `Ok(None)` when nobody is signed in and the policy is `Drop`.
    pub fn save_state<P, C>(
        &self,
        action: &str,
        entity: &EntityRef,
        previous: &P,
        current: &C,
    ) -> Result<Option<EntryId>, HistoryError>
    where
        P: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        let Some(actor) = self.identity.current_actor() else {
            return match self.policy {
                UnauthenticatedPolicy::Drop => {
                    debug!(action, entity = %entity, "no signed-in user, change not recorded");
                    Ok(None)
                }
                UnauthenticatedPolicy::Reject => Err(HistoryError::Unauthenticated),
            };
        };
        self.history
            .lock()
            .record_change(action, entity, previous, current, &actor)
            .map(Some)
    }

    /// Entries matching `filter`, newest first
    pub fn get_history(&self, filter: &HistoryFilter) -> Vec<ChangeEntry> {
        self.history.lock().query_history(filter)
    }

    /// A single entry by id
    pub fn entry(&self, id: &EntryId) -> Option<ChangeEntry> {
        self.history.lock().get(id).cloned()
    }

    /// The newest entry, if any
    pub fn latest(&self) -> Option<ChangeEntry> {
        self.history.lock().latest().cloned()
    }

    /// Roll back entry `id`, passing its previous snapshot to `restore`
    ///
    /// The store lock is released before `restore` runs, so the callback may
    /// call back into the coordinator.
    pub fn rollback<F, E>(&self, id: &EntryId, restore: F) -> RollbackOutcome
    where
        F: FnOnce(&Value) -> Result<(), E>,
        E: fmt::Display,
    {
        let consumed = self.history.lock().consume_for_rollback(id);
        let Some(RollbackRecord { original, audit_id }) = consumed else {
            debug!(entry = %id, "rollback target not found");
            return RollbackOutcome::NotFound;
        };

        match restore(original.previous_state()) {
            Ok(()) => {
                info!(entry = %id, audit = %audit_id, action = original.action(), "rolled back");
                RollbackOutcome::Completed { original, audit_id }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(entry = %id, audit = %audit_id, %reason, "restore failed after rollback was recorded");
                RollbackOutcome::RestoreFailed {
                    original,
                    audit_id,
                    reason,
                }
            }
        }
    }

    /// Typed rollback: the previous snapshot is deserialized into `T` first
    ///
    /// A snapshot that does not fit `T` counts as a failed restore.
    pub fn rollback_as<T, F, E>(&self, id: &EntryId, restore: F) -> RollbackOutcome
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> Result<(), E>,
        E: fmt::Display,
    {
        self.rollback(id, |value| -> Result<(), String> {
            let state: T = snapshot::restore(value).map_err(|e| e.to_string())?;
            restore(state).map_err(|e| e.to_string())
        })
    }

    /// Remove every entry, or only those of `entity_type`
    pub fn clear_history(&self, entity_type: Option<&str>) -> usize {
        self.history.lock().clear_history(entity_type)
    }
}
