//! Override table: manual corrections for resolution the matcher cannot see.
//!
//! Some renames preserve semantics but defeat name-based matching (for example
//! an inlined helper field that takes over an exported value). Each entry says
//! "in version B, the member exported as `stable_name` from unit `unit` is
//! really called `member`". Entries are data, loaded once before a run, and
//! always take precedence over automatic matching.
//!
//! Rows for past revisions can be kept with `active: false`; inactive rows are
//! never consulted.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MemberKind;

fn default_active() -> bool {
    true
}

/// One manual exception row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Unit identity in version A.
    pub unit: String,
    pub stable_name: String,
    /// Concrete member name in version B.
    pub member: String,
    /// Restrict the entry to fields or methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemberKind>,
    /// Unit in version B holding the member. Required to pin static members to
    /// one unit; for instance members it replaces the mapped counterpart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl OverrideEntry {
    pub fn new(
        unit: impl Into<String>,
        stable_name: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            stable_name: stable_name.into(),
            member: member.into(),
            kind: None,
            target_unit: None,
            note: None,
            active: true,
        }
    }

    pub fn with_kind(mut self, kind: MemberKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_target_unit(mut self, unit: impl Into<String>) -> Self {
        self.target_unit = Some(unit.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Error type for malformed override tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("Override entry {index} has an empty '{field}'")]
    EmptyField { index: usize, field: &'static str },

    #[error("Duplicate active override for unit '{unit}', stable name '{stable_name}'")]
    Duplicate { unit: String, stable_name: String, kind: Option<MemberKind> },
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct OverrideDocument {
    #[serde(default)]
    overrides: Vec<OverrideEntry>,
}

/// Read-only table of override entries keyed by (unit, stable name).
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: Vec<OverrideEntry>,
    active: HashMap<(String, String), Vec<usize>>,
}

impl OverrideTable {
    /// A table with no entries; resolution falls back to name matching.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table, rejecting empty identifiers and conflicting active rows.
    pub fn from_entries(entries: Vec<OverrideEntry>) -> Result<Self, OverrideError> {
        let mut active: HashMap<(String, String), Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            for (field, value) in [
                ("unit", &entry.unit),
                ("stable_name", &entry.stable_name),
                ("member", &entry.member),
            ] {
                if value.trim().is_empty() {
                    return Err(OverrideError::EmptyField { index, field });
                }
            }
            if !entry.active {
                continue;
            }

            let slot = active.entry((entry.unit.clone(), entry.stable_name.clone())).or_default();
            if slot.iter().any(|&other| entries[other].kind == entry.kind) {
                return Err(OverrideError::Duplicate {
                    unit: entry.unit.clone(),
                    stable_name: entry.stable_name.clone(),
                    kind: entry.kind,
                });
            }
            slot.push(index);
        }
        Ok(Self { entries, active })
    }

    /// Load an `{ overrides: [...] }` document (JSON or YAML) from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let doc: OverrideDocument = crate::format::load_document(path, "override table")?;
        Ok(Self::from_entries(doc.overrides)?)
    }

    /// Active entry for a member of the given kind.
    ///
    /// A kind-specific row beats a kind-agnostic one.
    pub fn lookup(&self, unit: &str, stable_name: &str, kind: MemberKind) -> Option<&OverrideEntry> {
        let candidates = self.active.get(&(unit.to_string(), stable_name.to_string()))?;
        let mut fallback = None;
        for &idx in candidates {
            let entry = &self.entries[idx];
            match entry.kind {
                Some(k) if k == kind => return Some(entry),
                None => fallback = Some(entry),
                Some(_) => {}
            }
        }
        fallback
    }

    /// Concrete member name overriding `(unit, stable_name)`, regardless of kind.
    pub fn lookup_override(&self, unit: &str, stable_name: &str) -> Option<&str> {
        self.active
            .get(&(unit.to_string(), stable_name.to_string()))
            .and_then(|idxs| idxs.first())
            .map(|&idx| self.entries[idx].member.as_str())
    }

    /// All rows, including inactive history.
    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    pub fn active_entries(&self) -> impl Iterator<Item = &OverrideEntry> {
        self.entries.iter().filter(|e| e.active)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
