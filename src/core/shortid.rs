//! Short references for history entries
//!
//! Listing history assigns session-local aliases `@1`, `@2`, ... in display
//! order so users can type `freshline rollback @3` instead of a full ULID.
//! The mapping is persisted in `<data_dir>/shortids.json` and rebuilt by every
//! listing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::entry::EntryId;

/// Index file name within the data directory
const INDEX_FILE: &str = "shortids.json";

/// Mapping of `@N` aliases to entry ids
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Maps N to the full entry id
    entries: HashMap<u32, EntryId>,
    /// Reverse lookup
    #[serde(skip)]
    reverse: HashMap<EntryId, u32>,
    next_id: u32,
}

impl ShortIdIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            reverse: HashMap::new(),
            next_id: 1,
        }
    }

    /// Load the index from a data directory, or create empty if not found
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(INDEX_FILE);
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(mut index) = serde_json::from_str::<ShortIdIndex>(&content) {
                index.reverse = index.entries.iter().map(|(k, v)| (*v, *k)).collect();
                return index;
            }
        }
        Self::new()
    }

    /// Save the index to a data directory
    pub fn save(&self, data_dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(data_dir.join(INDEX_FILE), content)
    }

    /// Clear and assign fresh aliases in the given order
    pub fn rebuild<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntryId>) {
        self.entries.clear();
        self.reverse.clear();
        self.next_id = 1;
        for id in ids {
            self.add(*id);
        }
    }

    /// Add an id and return its alias number
    pub fn add(&mut self, id: EntryId) -> u32 {
        if let Some(&existing) = self.reverse.get(&id) {
            return existing;
        }
        let n = self.next_id.max(1);
        self.next_id = n + 1;
        self.entries.insert(n, id);
        self.reverse.insert(id, n);
        n
    }

    /// Resolve `@N`, `N`, `CHG-<ULID>` or a bare ULID
    pub fn resolve(&self, reference: &str) -> Option<EntryId> {
        let reference = reference.trim();
        let num_str = reference.strip_prefix('@').unwrap_or(reference);
        if !num_str.is_empty() && num_str.chars().all(|c| c.is_ascii_digit()) {
            return num_str
                .parse::<u32>()
                .ok()
                .and_then(|n| self.entries.get(&n).copied());
        }
        EntryId::parse(reference).ok()
    }

    /// Alias of an entry id, if it has one
    pub fn get_short_id(&self, id: &EntryId) -> Option<String> {
        self.reverse.get(id).map(|n| format!("@{}", n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
