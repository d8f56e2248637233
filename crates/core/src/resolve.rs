//! Resolver: find the version B counterpart of an exported version A member.
//!
//! Instance members are scoped by the unit mapping: their counterpart must
//! live on the mapped unit. Static members are process-wide and may migrate
//! between units, so they are looked up across every unit of version B.
//! Either way, an active override entry is consulted before name matching.

use tracing::debug;

use crate::exports::{ExportedMember, StaticExports};
use crate::mapping::UnitMapping;
use crate::model::{Binding, Member, ProgramImage, Unit};
use crate::overrides::{OverrideEntry, OverrideTable};
use crate::report::{ConfigurationError, StaleOverrideReason};

/// A successfully resolved counterpart.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'b> {
    pub unit: &'b Unit,
    pub member: &'b Member,
    /// True when an override entry, not name matching, produced the result.
    pub via_override: bool,
}

/// Outcome of resolving one member. Failure is not itself an error; the
/// checker assigns severity.
#[derive(Debug, Clone)]
pub enum Resolution<'b> {
    Resolved(Resolved<'b>),
    /// The mapping has no counterpart unit for an instance member's unit.
    NoCounterpartUnit,
    /// A counterpart exists (or, for statics, the whole image was searched)
    /// but no member matches. `counterpart` is the unit searched, if a single
    /// one was.
    Missing { counterpart: Option<&'b str> },
    /// The applicable override entry points at nothing.
    StaleOverride(ConfigurationError),
}

impl<'b> Resolution<'b> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&Resolved<'b>> {
        match self {
            Resolution::Resolved(r) => Some(r),
            _ => None,
        }
    }
}

/// Resolves members of version A against version B.
pub struct Resolver<'b> {
    image_b: &'b ProgramImage,
    mapping: &'b dyn UnitMapping,
    overrides: &'b OverrideTable,
    statics: StaticExports<'b>,
}

impl<'b> Resolver<'b> {
    pub fn new(
        image_b: &'b ProgramImage,
        mapping: &'b dyn UnitMapping,
        overrides: &'b OverrideTable,
    ) -> Self {
        Self { image_b, mapping, overrides, statics: StaticExports::build(image_b) }
    }

    /// Mapped counterpart of `unit_a` in version B.
    ///
    /// A mapping that names a unit absent from version B counts as no
    /// counterpart.
    pub fn counterpart_unit(&self, unit_a: &Unit) -> Option<&'b Unit> {
        let name = self.mapping.counterpart(&unit_a.name)?;
        let unit = self.image_b.unit(name);
        if unit.is_none() {
            tracing::warn!(
                unit = %unit_a.name,
                counterpart = name,
                "mapping names a counterpart unit missing from the new image"
            );
        }
        unit
    }

    /// Resolve by binding mode.
    pub fn resolve(&self, export: &ExportedMember<'_>) -> Resolution<'b> {
        match export.binding() {
            Binding::Instance => self.resolve_instance(export),
            Binding::Static => self.resolve_static(export),
        }
    }

    /// Resolve an instance member through the unit mapping.
    pub fn resolve_instance(&self, export: &ExportedMember<'_>) -> Resolution<'b> {
        let Some(unit_b) = self.counterpart_unit(export.unit) else {
            return Resolution::NoCounterpartUnit;
        };

        if let Some(entry) = self.override_for(export) {
            let target = match &entry.target_unit {
                Some(name) => match self.image_b.unit(name) {
                    Some(unit) => unit,
                    None => {
                        return Resolution::StaleOverride(stale(
                            export,
                            entry,
                            StaleOverrideReason::TargetUnitNotFound,
                        ))
                    }
                },
                None => unit_b,
            };
            return match target.member(&entry.member, export.member.kind) {
                Some(member) => {
                    debug!(member = %export.label(), target = %target.member_label(member), "resolved via override");
                    Resolution::Resolved(Resolved { unit: target, member, via_override: true })
                }
                None => Resolution::StaleOverride(ConfigurationError {
                    target_unit: Some(target.name.clone()),
                    ..stale(export, entry, StaleOverrideReason::MemberNotFound)
                }),
            };
        }

        let found = unit_b
            .members
            .iter()
            .find(|m| m.kind == export.member.kind && m.exports_as(export.stable_name));
        match found {
            Some(member) => {
                Resolution::Resolved(Resolved { unit: unit_b, member, via_override: false })
            }
            None => Resolution::Missing { counterpart: Some(unit_b.name.as_str()) },
        }
    }

    /// Resolve a static member by stable name across every unit of version B.
    ///
    /// Independent of the mapping.
    pub fn resolve_static(&self, export: &ExportedMember<'_>) -> Resolution<'b> {
        if let Some(entry) = self.override_for(export) {
            return self.resolve_static_override(export, entry);
        }

        match self.statics.get(export.member.kind, export.stable_name) {
            Some(hit) => Resolution::Resolved(Resolved {
                unit: hit.unit,
                member: hit.member,
                via_override: false,
            }),
            None => Resolution::Missing { counterpart: None },
        }
    }

    fn resolve_static_override(
        &self,
        export: &ExportedMember<'_>,
        entry: &OverrideEntry,
    ) -> Resolution<'b> {
        let kind = export.member.kind;
        let candidates: Vec<&'b Unit> = match &entry.target_unit {
            Some(name) => match self.image_b.unit(name) {
                Some(unit) => vec![unit],
                None => {
                    return Resolution::StaleOverride(stale(
                        export,
                        entry,
                        StaleOverrideReason::TargetUnitNotFound,
                    ))
                }
            },
            None => self.image_b.units().iter().collect(),
        };

        let mut saw_instance = false;
        for unit in candidates {
            for member in unit.members.iter().filter(|m| m.kind == kind && m.name == entry.member) {
                if member.is_static {
                    debug!(member = %export.label(), target = %unit.member_label(member), "resolved static via override");
                    return Resolution::Resolved(Resolved { unit, member, via_override: true });
                }
                saw_instance = true;
            }
        }

        let reason = if saw_instance {
            StaleOverrideReason::NotStatic
        } else {
            StaleOverrideReason::MemberNotFound
        };
        Resolution::StaleOverride(stale(export, entry, reason))
    }

    fn override_for(&self, export: &ExportedMember<'_>) -> Option<&'b OverrideEntry> {
        self.overrides.lookup(&export.unit.name, export.stable_name, export.member.kind)
    }
}

fn stale(
    export: &ExportedMember<'_>,
    entry: &OverrideEntry,
    reason: StaleOverrideReason,
) -> ConfigurationError {
    ConfigurationError {
        unit: entry.unit.clone(),
        stable_name: entry.stable_name.clone(),
        member: entry.member.clone(),
        member_kind: export.member.kind,
        target_unit: entry.target_unit.clone(),
        reason,
    }
}
