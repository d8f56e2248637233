//! Import requirements: which stable names an external consumer depends on.
//!
//! Whether a missing stable name is an error or a warning depends on whether
//! something outside the checked images consumes it. That knowledge lives with
//! the consumer, so the checker asks an injected [`ImportOracle`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::{Binding, Member, Unit};

/// Answers "is this stable name required by an external consumer?".
pub trait ImportOracle: Send + Sync {
    fn is_import_required(&self, unit: &Unit, member: &Member, stable_name: &str) -> bool;
}

/// Oracle for runs without a consumer contract: nothing is imported, so every
/// missing name is a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImports;

impl ImportOracle for NoImports {
    fn is_import_required(&self, _unit: &Unit, _member: &Member, _stable_name: &str) -> bool {
        false
    }
}

/// Consumer contract loaded from a `{ interfaces: {...}, statics: [...] }`
/// document.
///
/// Instance members are imported when their unit declares an interface binding
/// listed under `interfaces` and the stable name appears in that list. Static
/// members are imported when the stable name appears in `statics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerContract {
    #[serde(default)]
    pub interfaces: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub statics: BTreeSet<String>,
}

impl ConsumerContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        crate::format::load_document(path, "consumer contract")
    }

    pub fn with_instance_import(
        mut self,
        interface: impl Into<String>,
        stable_name: impl Into<String>,
    ) -> Self {
        self.interfaces.entry(interface.into()).or_default().insert(stable_name.into());
        self
    }

    pub fn with_static_import(mut self, stable_name: impl Into<String>) -> Self {
        self.statics.insert(stable_name.into());
        self
    }

    /// Total number of imported names across interfaces and statics.
    pub fn len(&self) -> usize {
        self.interfaces.values().map(BTreeSet::len).sum::<usize>() + self.statics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImportOracle for ConsumerContract {
    fn is_import_required(&self, unit: &Unit, member: &Member, stable_name: &str) -> bool {
        match member.binding() {
            Binding::Static => self.statics.contains(stable_name),
            Binding::Instance => unit
                .interface
                .as_deref()
                .and_then(|iface| self.interfaces.get(iface))
                .is_some_and(|names| names.contains(stable_name)),
        }
    }
}
