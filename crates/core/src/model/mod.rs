//! Core data model for program images, units, and members.
//!
//! A program image is one version's full set of compiled units. Each unit owns
//! its fields and methods; each member may declare stable export names. Images
//! are handed over by the artifact loader as JSON/YAML documents and are
//! immutable once constructed.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a member is a field or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding mode of a member.
///
/// Instance members live on their unit and are resolved through the unit
/// mapping; static members are process-wide and may move between units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Instance,
    Static,
}

impl Binding {
    pub fn as_str(self) -> &'static str {
        match self {
            Binding::Instance => "instance",
            Binding::Static => "static",
        }
    }
}

/// A field or method declared by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    /// Optional type signature, used to tell overloads apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    /// Declared stable-name tags. Well-formed members carry at most one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
}

impl Member {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self { name: name.into(), kind, is_static: false, descriptor: None, exports: Vec::new() }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Field)
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Method)
    }

    /// Builder-style helper marking the member static.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }

    /// Builder-style helper adding a stable-name tag.
    pub fn with_export(mut self, stable_name: impl Into<String>) -> Self {
        self.exports.push(stable_name.into());
        self
    }

    pub fn binding(&self) -> Binding {
        if self.is_static {
            Binding::Static
        } else {
            Binding::Instance
        }
    }

    /// The stable name this member resolves under (its first tag).
    pub fn stable_name(&self) -> Option<&str> {
        self.exports.first().map(String::as_str)
    }

    pub fn is_exported(&self) -> bool {
        !self.exports.is_empty()
    }

    pub fn exports_as(&self, stable_name: &str) -> bool {
        self.exports.iter().any(|e| e == stable_name)
    }

    /// Member name plus descriptor, e.g. `m12(I)V` or `field7`.
    pub fn signature(&self) -> String {
        match &self.descriptor {
            Some(desc) => format!("{}{}", self.name, desc),
            None => self.name.clone(),
        }
    }
}

/// A compiled class-like container of fields and methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    /// Name of the abstraction this unit claims to implement, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), interface: None, members: Vec::new() }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Find a member by name and kind (first declared wins for overloads).
    pub fn member(&self, name: &str, kind: MemberKind) -> Option<&Member> {
        self.members.iter().find(|m| m.kind == kind && m.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Field)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Method)
    }

    /// Qualified label for a member of this unit, e.g. `Player.field12`.
    pub fn member_label(&self, member: &Member) -> String {
        format!("{}.{}", self.name, member.signature())
    }
}

/// Error type for malformed program images.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unit at index {0} has an empty name")]
    EmptyUnitName(usize),

    #[error("Duplicate unit '{0}' in program image")]
    DuplicateUnit(String),

    #[error("Unit '{unit}' has a member with an empty name")]
    EmptyMemberName { unit: String },

    #[error("Unit '{unit}' declares {kind} '{member}' more than once")]
    DuplicateMember { unit: String, member: String, kind: MemberKind },
}

/// Serialized form of a program image as produced by the artifact loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImageDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    units: Vec<Unit>,
}

/// One version's full, ordered set of compiled units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ImageDocument", into = "ImageDocument")]
pub struct ProgramImage {
    name: Option<String>,
    units: Vec<Unit>,
    index: HashMap<String, usize>,
}

impl ProgramImage {
    /// Build an image, validating unit and member identity.
    pub fn new(name: Option<String>, units: Vec<Unit>) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(units.len());
        for (idx, unit) in units.iter().enumerate() {
            if unit.name.trim().is_empty() {
                return Err(ModelError::EmptyUnitName(idx));
            }
            if index.insert(unit.name.clone(), idx).is_some() {
                return Err(ModelError::DuplicateUnit(unit.name.clone()));
            }

            let mut seen = HashSet::new();
            for member in &unit.members {
                if member.name.trim().is_empty() {
                    return Err(ModelError::EmptyMemberName { unit: unit.name.clone() });
                }
                if !seen.insert((member.kind, member.name.as_str(), member.descriptor.as_deref())) {
                    return Err(ModelError::DuplicateMember {
                        unit: unit.name.clone(),
                        member: member.signature(),
                        kind: member.kind,
                    });
                }
            }
        }
        Ok(Self { name, units, index })
    }

    /// Load an image document (JSON or YAML) from disk.
    pub fn load(path: &Path) -> Result<Self> {
        crate::format::load_document(path, "program image")
    }

    /// Optional label (typically a revision) carried by the image.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.index.get(name).map(|&idx| &self.units[idx])
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate every member of every unit, in image order.
    pub fn members(&self) -> impl Iterator<Item = (&Unit, &Member)> {
        self.units.iter().flat_map(|u| u.members.iter().map(move |m| (u, m)))
    }
}

impl TryFrom<ImageDocument> for ProgramImage {
    type Error = ModelError;

    fn try_from(doc: ImageDocument) -> Result<Self, Self::Error> {
        ProgramImage::new(doc.name, doc.units)
    }
}

impl From<ProgramImage> for ImageDocument {
    fn from(image: ProgramImage) -> Self {
        ImageDocument { name: image.name, units: image.units }
    }
}
