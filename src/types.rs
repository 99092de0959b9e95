use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A foreign-key field on a placement record. Starts out as the raw numeric
/// id from the export and is swapped for the display name once the reference
/// resolver finds a match. An `Unresolved` value surviving to output means no
/// reference row existed for that id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefField {
    Resolved(String),
    Unresolved(i64),
}

impl RefField {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RefField::Resolved(_))
    }

    /// Value this field contributes to an output row: the display name when
    /// resolved, otherwise the raw id rendered as text.
    pub fn display_value(&self) -> String {
        match self {
            RefField::Resolved(name) => name.clone(),
            RefField::Unresolved(raw) => raw.to_string(),
        }
    }
}

/// One enrolled individual from the placement export. Name fields stay unset
/// until the identity joiner copies them in from a registry match; records
/// with no match keep them unset all the way into the rejects dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// National identifier (hetu), the join key against the registry
    pub identifier: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub preferred_name: Option<String>,
    /// Class group, resolved against the department export
    pub group: RefField,
    /// Daycare unit, resolved against the unit export
    pub unit: RefField,
    pub student_category: String,
}

/// One citizen row from the registry export, already split into name parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub identifier: String,
    pub given_name: String,
    pub family_name: String,
}

/// Lookup table from a numeric foreign key to a display name. Read-only
/// after parse; duplicate ids keep the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    entries: HashMap<i64, String>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// First occurrence wins; later duplicates are dropped with a warning so
    /// silently conflicting reference rows show up in the logs.
    pub fn insert(&mut self, id: i64, name: String, source_name: &str) {
        match self.entries.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(name);
            }
            Entry::Occupied(existing) => {
                warn!(
                    source = source_name,
                    id,
                    kept = %existing.get(),
                    dropped = %name,
                    "duplicate reference id, keeping first occurrence"
                );
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two disjoint output partitions produced by the identity join. Every
/// input placement record lands in exactly one of the two, in input order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub matched: Vec<PlacementRecord>,
    pub unmatched: Vec<PlacementRecord>,
}

impl ResultSet {
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}
