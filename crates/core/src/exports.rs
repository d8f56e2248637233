//! Symbol table builder: which members declare a stable export name.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Binding, Member, MemberKind, ProgramImage, Unit};

/// A member carrying at least one stable-name tag, with the name it resolves
/// under.
#[derive(Debug, Clone, Copy)]
pub struct ExportedMember<'a> {
    pub unit: &'a Unit,
    pub member: &'a Member,
    pub stable_name: &'a str,
}

impl<'a> ExportedMember<'a> {
    /// True when the member carries more than one tag (a well-formedness defect).
    pub fn is_ambiguous(&self) -> bool {
        self.member.exports.len() > 1
    }

    pub fn binding(&self) -> Binding {
        self.member.binding()
    }

    pub fn label(&self) -> String {
        self.unit.member_label(self.member)
    }
}

/// Every exported member of `unit`, in declaration order.
///
/// Members with several tags are included under their first tag; callers can
/// spot them with [`ExportedMember::is_ambiguous`].
pub fn collect_exports(unit: &Unit) -> Vec<ExportedMember<'_>> {
    unit.members
        .iter()
        .filter_map(|member| {
            member.stable_name().map(|stable_name| ExportedMember { unit, member, stable_name })
        })
        .collect()
}

/// Members of `unit` carrying more than one stable-name tag.
pub fn multi_tag_members(unit: &Unit) -> impl Iterator<Item = &Member> {
    unit.members.iter().filter(|m| m.exports.len() > 1)
}

/// Stable names claimed by two or more distinct members of `unit`.
///
/// Returned in order of first claim, each with its claimants in declaration
/// order. Fields and methods share one namespace here.
pub fn duplicate_claims(unit: &Unit) -> Vec<(&str, Vec<&Member>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut claims: HashMap<&str, Vec<&Member>> = HashMap::new();
    for member in &unit.members {
        for tag in &member.exports {
            let claimants = claims.entry(tag.as_str()).or_insert_with(|| {
                order.push(tag.as_str());
                Vec::new()
            });
            if !claimants.iter().any(|m| std::ptr::eq(*m, member)) {
                claimants.push(member);
            }
        }
    }
    order
        .into_iter()
        .filter_map(|name| {
            let claimants = claims.remove(name)?;
            (claimants.len() > 1).then_some((name, claimants))
        })
        .collect()
}

/// Index of the static exports of a whole image, keyed by kind then stable name.
///
/// Static members are not unit-scoped, so lookups span every unit. When more
/// than one unit exports the same static name, the first in image order wins.
#[derive(Debug, Default)]
pub struct StaticExports<'a> {
    by_kind: HashMap<MemberKind, HashMap<&'a str, ExportedMember<'a>>>,
}

impl<'a> StaticExports<'a> {
    pub fn build(image: &'a ProgramImage) -> Self {
        let mut by_kind: HashMap<MemberKind, HashMap<&'a str, ExportedMember<'a>>> =
            HashMap::new();
        for (unit, member) in image.members() {
            if !member.is_static {
                continue;
            }
            let names = by_kind.entry(member.kind).or_default();
            for tag in &member.exports {
                names.entry(tag.as_str()).or_insert(ExportedMember {
                    unit,
                    member,
                    stable_name: tag.as_str(),
                });
            }
        }
        Self { by_kind }
    }

    /// Static member of `kind` exported as `stable_name`, if any unit has one.
    pub fn get(&self, kind: MemberKind, stable_name: &str) -> Option<&ExportedMember<'a>> {
        self.by_kind.get(&kind)?.get(stable_name)
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serializable row of an image's symbol table, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    pub unit: String,
    pub member: String,
    pub kind: MemberKind,
    pub binding: Binding,
    pub stable_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_tags: Vec<String>,
}

/// Flatten an image's exports into listing rows, in image order.
pub fn symbol_table(image: &ProgramImage) -> Vec<SymbolEntry> {
    image
        .units()
        .iter()
        .flat_map(collect_exports)
        .map(|export| SymbolEntry {
            unit: export.unit.name.clone(),
            member: export.member.signature(),
            kind: export.member.kind,
            binding: export.binding(),
            stable_name: export.stable_name.to_string(),
            extra_tags: export.member.exports.iter().skip(1).cloned().collect(),
        })
        .collect()
}
