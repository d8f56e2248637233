//! Unit-to-unit mapping between two program image versions.
//!
//! The mapping itself is computed by an external matcher. The checker only
//! queries it, through the [`UnitMapping`] trait, so any provider can be
//! plugged in. [`MappingTable`] is the file-backed provider used by the CLI.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Read-only lookup from a unit of version A to its believed counterpart in
/// version B.
///
/// Not necessarily injective or total: `None` means no counterpart was found.
pub trait UnitMapping: Send + Sync {
    fn counterpart(&self, unit_a: &str) -> Option<&str>;
}

/// Mapping loaded from a `{ units: { A: B, ... } }` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    #[serde(default)]
    units: BTreeMap<String, String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping document (JSON or YAML) from disk.
    pub fn load(path: &Path) -> Result<Self> {
        crate::format::load_document(path, "unit mapping")
    }

    pub fn insert(&mut self, unit_a: impl Into<String>, unit_b: impl Into<String>) -> &mut Self {
        self.units.insert(unit_a.into(), unit_b.into());
        self
    }

    /// Builder-style variant of [`MappingTable::insert`].
    pub fn with(mut self, unit_a: impl Into<String>, unit_b: impl Into<String>) -> Self {
        self.insert(unit_a, unit_b);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.units.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }
}

impl UnitMapping for MappingTable {
    fn counterpart(&self, unit_a: &str) -> Option<&str> {
        self.units.get(unit_a).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { units: iter.into_iter().collect() }
    }
}
