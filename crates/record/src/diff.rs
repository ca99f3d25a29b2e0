//! Per-tag structural diff between a stored and a harvested record.
//!
//! Collaborator contract: the reconciliation engine only classifies the
//! codes produced here, it never recomputes field equality itself.

use std::collections::BTreeMap;

use crate::model::Record;

/// Single-letter classification of one tag's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiffCode {
    /// Tag present only in the stored record.
    Removed,
    /// Tag present only in the harvested record.
    Added,
    /// Tag present in both with different field content.
    Changed,
}

impl DiffCode {
    pub fn letter(self) -> char {
        match self {
            Self::Removed => 'r',
            Self::Added => 'a',
            Self::Changed => 'c',
        }
    }
}

impl std::fmt::Display for DiffCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Tags with a difference; tags absent from the map are identical.
pub type DiffResult = BTreeMap<String, DiffCode>;

/// Compare two records tag by tag.
pub fn record_diff(stored: &Record, harvested: &Record) -> DiffResult {
    let mut diff = DiffResult::new();

    for (tag, stored_fields) in stored.iter() {
        if !harvested.has_tag(tag) {
            diff.insert(tag.to_string(), DiffCode::Removed);
        } else if stored_fields != harvested.fields(tag) {
            diff.insert(tag.to_string(), DiffCode::Changed);
        }
    }

    for (tag, _) in harvested.iter() {
        if !stored.has_tag(tag) {
            diff.insert(tag.to_string(), DiffCode::Added);
        }
    }

    diff
}
