//! Change entries - the unit of the history log
//!
//! An entry pairs a before/after snapshot of one entity with the action label
//! and the actor that caused it. Entries are created only by the history store
//! and are immutable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Prefix used when displaying entry ids
pub const ENTRY_PREFIX: &str = "CHG";

/// Unique identifier of a change entry
///
/// Backed by a ULID so ids carry their creation time and sort in creation
/// order. Displayed as `CHG-<ULID>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(Ulid);

/// Errors from parsing an entry id
#[derive(Debug, Error, miette::Diagnostic)]
pub enum EntryIdError {
    #[error("Invalid entry id '{input}': {reason}")]
    #[diagnostic(
        code(freshline::entry::invalid_id),
        help("entry ids look like CHG-01J9Z3K8Q4W6X2M5N7P0R1S3T4")
    )]
    Invalid { input: String, reason: String },
}

impl EntryId {
    /// Wrap an already generated ULID
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// The underlying ULID
    pub fn ulid(&self) -> Ulid {
        self.0
    }

    /// Parse `CHG-<ULID>` or a bare ULID
    pub fn parse(s: &str) -> Result<Self, EntryIdError> {
        let trimmed = s.trim();
        let body = match trimmed.split_once('-') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case(ENTRY_PREFIX) => rest,
            Some((prefix, _)) => {
                return Err(EntryIdError::Invalid {
                    input: s.to_string(),
                    reason: format!("unknown prefix '{}'", prefix),
                })
            }
            None => trimmed,
        };
        Ulid::from_string(body)
            .map(Self)
            .map_err(|e| EntryIdError::Invalid {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", ENTRY_PREFIX, self.0)
    }
}

impl FromStr for EntryId {
    type Err = EntryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntryId {
    type Error = EntryIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.to_string()
    }
}

/// The entity a change belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// Category discriminator (e.g. "product", "system")
    pub entity_type: String,
    /// Instance identifier within the type
    pub entity_id: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}

/// Identity of whoever caused a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Sentinel identity stamped on rollback audit entries
    pub fn system() -> Self {
        Self::new("system", "System")
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One recorded snapshot pair with its metadata
///
/// Field names serialize in camelCase, which is also the persisted layout of
/// the durable slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    id: EntryId,
    timestamp: DateTime<Utc>,
    action: String,
    entity_type: String,
    entity_id: String,
    previous_state: Value,
    current_state: Value,
    user_id: String,
    user_name: String,
}

impl ChangeEntry {
    pub(crate) fn new(
        id: EntryId,
        timestamp: DateTime<Utc>,
        action: String,
        entity: EntityRef,
        previous_state: Value,
        current_state: Value,
        actor: Actor,
    ) -> Self {
        Self {
            id,
            timestamp,
            action,
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            previous_state,
            current_state,
            user_id: actor.id,
            user_name: actor.name,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(&self.entity_type, &self.entity_id)
    }

    /// Snapshot taken before the change
    pub fn previous_state(&self) -> &Value {
        &self.previous_state
    }

    /// Snapshot taken after the change
    pub fn current_state(&self) -> &Value {
        &self.current_state
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// True for entries recorded by a rollback
    pub fn is_rollback(&self) -> bool {
        self.action.starts_with(ROLLBACK_ACTION_PREFIX)
    }
}

/// Label prefix of rollback audit entries
pub const ROLLBACK_ACTION_PREFIX: &str = "Rollback: ";

/// Build the action label of the audit entry for rolling back `action`
pub fn rollback_action(action: &str) -> String {
    format!("{}{}", ROLLBACK_ACTION_PREFIX, action)
}
