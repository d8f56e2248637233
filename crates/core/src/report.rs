//! Findings and the report a check run returns to its caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exports::ExportedMember;
use crate::model::{Binding, Member, MemberKind, Unit};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Classification of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A stable name an external consumer depends on cannot be resolved.
    MissingImportedMember,
    /// A tracked stable name nothing consumes cannot be resolved.
    MissingExportedMember,
    /// A unit of version B claims one stable name more than once.
    AmbiguousExport,
}

impl FindingKind {
    pub fn severity(self) -> Severity {
        match self {
            FindingKind::MissingImportedMember | FindingKind::AmbiguousExport => Severity::Error,
            FindingKind::MissingExportedMember => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::MissingImportedMember => "missing_imported_member",
            FindingKind::MissingExportedMember => "missing_exported_member",
            FindingKind::AmbiguousExport => "ambiguous_export",
        }
    }
}

/// Why an export is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityCause {
    /// One member carries more than one stable-name tag.
    MultipleTags,
    /// Two or more members of the unit carry the same stable name.
    DuplicateName,
}

/// One actionable problem discovered by a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Unit the finding is about: the version A unit for missing members, the
    /// version B unit for ambiguity.
    pub unit: String,
    /// Version B counterpart of `unit`, when one was mapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart: Option<String>,
    pub member: String,
    pub member_kind: MemberKind,
    pub binding: Binding,
    pub stable_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<AmbiguityCause>,
    /// Every member involved in an ambiguity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claimants: Vec<String>,
}

impl Finding {
    fn missing(kind: FindingKind, export: &ExportedMember<'_>, counterpart: Option<&str>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            unit: export.unit.name.clone(),
            counterpart: counterpart.map(str::to_string),
            member: export.member.signature(),
            member_kind: export.member.kind,
            binding: export.binding(),
            stable_name: export.stable_name.to_string(),
            cause: None,
            claimants: Vec::new(),
        }
    }

    pub fn missing_imported(export: &ExportedMember<'_>, counterpart: Option<&str>) -> Self {
        Self::missing(FindingKind::MissingImportedMember, export, counterpart)
    }

    pub fn missing_exported(export: &ExportedMember<'_>, counterpart: Option<&str>) -> Self {
        Self::missing(FindingKind::MissingExportedMember, export, counterpart)
    }

    /// A member of `unit` carrying more than one stable-name tag.
    ///
    /// `stable_name` holds the first tag; every tag is listed in `claimants`.
    pub fn multiple_tags(unit: &Unit, member: &Member) -> Self {
        Self {
            kind: FindingKind::AmbiguousExport,
            severity: FindingKind::AmbiguousExport.severity(),
            unit: unit.name.clone(),
            counterpart: None,
            member: member.signature(),
            member_kind: member.kind,
            binding: member.binding(),
            stable_name: member.exports.first().cloned().unwrap_or_default(),
            cause: Some(AmbiguityCause::MultipleTags),
            claimants: member.exports.clone(),
        }
    }

    /// Several members of `unit` claiming `stable_name`, reported against the
    /// first claimant. `None` when there are no claimants.
    pub(crate) fn duplicate_name(
        unit: &Unit,
        stable_name: &str,
        claimants: &[&Member],
    ) -> Option<Self> {
        let (first, _) = claimants.split_first()?;
        Some(Self {
            kind: FindingKind::AmbiguousExport,
            severity: FindingKind::AmbiguousExport.severity(),
            unit: unit.name.clone(),
            counterpart: None,
            member: first.signature(),
            member_kind: first.kind,
            binding: first.binding(),
            stable_name: stable_name.to_string(),
            cause: Some(AmbiguityCause::DuplicateName),
            claimants: claimants.iter().map(|m| m.signature()).collect(),
        })
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let member = format!("{}.{}", self.unit, self.member);
        match (self.kind, self.cause) {
            (FindingKind::MissingImportedMember, _) => match &self.counterpart {
                Some(other) => write!(
                    f,
                    "Missing IMPORTED {} on {} named {} ({})",
                    self.member_kind, other, self.stable_name, member
                ),
                None if self.binding == Binding::Static => write!(
                    f,
                    "Missing IMPORTED static {} named {} ({})",
                    self.member_kind, self.stable_name, member
                ),
                None => write!(
                    f,
                    "No counterpart unit for {} which contains imported {} {} ({})",
                    self.unit, self.member_kind, self.stable_name, member
                ),
            },
            (FindingKind::MissingExportedMember, _) => match &self.counterpart {
                Some(other) => write!(
                    f,
                    "Missing exported {} on {} named {} ({})",
                    self.member_kind, other, self.stable_name, member
                ),
                None => write!(
                    f,
                    "Missing exported static {} named {} ({})",
                    self.member_kind, self.stable_name, member
                ),
            },
            (FindingKind::AmbiguousExport, Some(AmbiguityCause::DuplicateName)) => write!(
                f,
                "Unit {} has {} members exported as {}: {}",
                self.unit,
                self.claimants.len(),
                self.stable_name,
                self.claimants.join(", ")
            ),
            (FindingKind::AmbiguousExport, _) => write!(
                f,
                "{} {} has more than 1 export: {}",
                capitalize(self.member_kind.as_str()),
                member,
                self.claimants.join(", ")
            ),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Why an override entry could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleOverrideReason {
    /// `target_unit` names a unit missing from version B.
    TargetUnitNotFound,
    /// No member of that name and kind exists on the target.
    MemberNotFound,
    /// The named member exists but is not static, while the exported member is.
    NotStatic,
}

/// An override entry that names something version B does not have.
///
/// The override itself is stale and has to be fixed by hand; this is reported
/// apart from findings and never downgraded to a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationError {
    /// Version A unit of the override key.
    pub unit: String,
    pub stable_name: String,
    /// Member name the override points at.
    pub member: String,
    pub member_kind: MemberKind,
    /// Version B unit that was searched, if a single one was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_unit: Option<String>,
    pub reason: StaleOverrideReason,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target_unit.as_deref().unwrap_or("any unit");
        let reason = match self.reason {
            StaleOverrideReason::TargetUnitNotFound => "target unit does not exist",
            StaleOverrideReason::MemberNotFound => "member does not exist",
            StaleOverrideReason::NotStatic => "member is not static",
        };
        write!(
            f,
            "Stale override ({}, {}) -> {} {} on {}: {}",
            self.unit, self.stable_name, self.member_kind, self.member, target, reason
        )
    }
}

/// Aggregate counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub errors: usize,
    pub warnings: usize,
    pub configuration_errors: usize,
}

/// Everything one check run found, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub configuration_errors: Vec<ConfigurationError>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn push_configuration_error(&mut self, error: ConfigurationError) {
        self.configuration_errors.push(error);
    }

    pub fn errors(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Error).count()
    }

    pub fn warnings(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Warning).count()
    }

    pub fn configuration_error_count(&self) -> usize {
        self.configuration_errors.len()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            errors: self.errors(),
            warnings: self.warnings(),
            configuration_errors: self.configuration_error_count(),
        }
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// No findings and no stale overrides.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.configuration_errors.is_empty()
    }

    /// Whether the run should be treated as passing.
    ///
    /// Errors and configuration errors always fail; warnings fail only when
    /// `deny_warnings` is set.
    pub fn passed(&self, deny_warnings: bool) -> bool {
        let summary = self.summary();
        summary.errors == 0
            && summary.configuration_errors == 0
            && (!deny_warnings || summary.warnings == 0)
    }
}
