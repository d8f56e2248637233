//! Consistency checker: the full pass over version A's exports plus the
//! ambiguity scan over version B.
//!
//! The pass is read-only over immutable inputs. Units are independent, so both
//! phases can run on a rayon pool; per-unit results are collected in unit
//! order, which keeps the report identical to a sequential run.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::exports::{collect_exports, duplicate_claims, multi_tag_members};
use crate::imports::{ImportOracle, NoImports};
use crate::mapping::UnitMapping;
use crate::model::{Binding, ProgramImage, Unit};
use crate::overrides::OverrideTable;
use crate::report::{ConfigurationError, Finding, Report, Severity};
use crate::resolve::{Resolution, Resolver};

static NO_IMPORTS: NoImports = NoImports;

/// Options controlling how a check run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Shard the per-unit work across a thread pool.
    pub parallel: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Findings produced for one unit.
#[derive(Debug, Default)]
struct UnitOutcome {
    findings: Vec<Finding>,
    configuration_errors: Vec<ConfigurationError>,
}

/// Drives one check of version A against version B.
pub struct ConsistencyChecker<'a> {
    image_a: &'a ProgramImage,
    image_b: &'a ProgramImage,
    mapping: &'a dyn UnitMapping,
    overrides: &'a OverrideTable,
    oracle: &'a dyn ImportOracle,
    options: CheckOptions,
}

impl<'a> ConsistencyChecker<'a> {
    /// Checker with no import requirements: every missing name is a warning
    /// unless an oracle is supplied with [`ConsistencyChecker::with_oracle`].
    pub fn new(
        image_a: &'a ProgramImage,
        image_b: &'a ProgramImage,
        mapping: &'a dyn UnitMapping,
        overrides: &'a OverrideTable,
    ) -> Self {
        Self {
            image_a,
            image_b,
            mapping,
            overrides,
            oracle: &NO_IMPORTS,
            options: CheckOptions::default(),
        }
    }

    pub fn with_oracle(mut self, oracle: &'a dyn ImportOracle) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the whole pass. Never stops early: the report reflects all breakage.
    pub fn run(&self) -> Report {
        let resolver = Resolver::new(self.image_b, self.mapping, self.overrides);
        let units_a = self.image_a.units();
        let units_b = self.image_b.units();

        let (member_pass, ambiguity_pass): (Vec<UnitOutcome>, Vec<Vec<Finding>>) =
            if self.options.parallel {
                rayon::join(
                    || units_a.par_iter().map(|u| self.check_unit(&resolver, u)).collect(),
                    || units_b.par_iter().map(scan_ambiguity).collect(),
                )
            } else {
                (
                    units_a.iter().map(|u| self.check_unit(&resolver, u)).collect(),
                    units_b.iter().map(scan_ambiguity).collect(),
                )
            };

        let mut report = Report::new();
        for outcome in member_pass {
            for finding in outcome.findings {
                log_finding(&finding);
                report.push(finding);
            }
            for stale in outcome.configuration_errors {
                warn!(unit = %stale.unit, stable_name = %stale.stable_name, "{stale}");
                report.push_configuration_error(stale);
            }
        }
        for finding in ambiguity_pass.into_iter().flatten() {
            log_finding(&finding);
            report.push(finding);
        }

        let summary = report.summary();
        info!(
            units_a = units_a.len(),
            units_b = units_b.len(),
            errors = summary.errors,
            warnings = summary.warnings,
            configuration_errors = summary.configuration_errors,
            "integrity check finished"
        );
        report
    }

    fn check_unit(&self, resolver: &Resolver<'_>, unit: &Unit) -> UnitOutcome {
        let mut outcome = UnitOutcome::default();
        for export in collect_exports(unit) {
            let required = self.oracle.is_import_required(unit, export.member, export.stable_name);
            let resolution = match export.binding() {
                Binding::Instance => resolver.resolve_instance(&export),
                Binding::Static => resolver.resolve_static(&export),
            };

            match resolution {
                Resolution::Resolved(found) => {
                    debug!(
                        member = %export.label(),
                        counterpart = %found.unit.member_label(found.member),
                        "resolved"
                    );
                }
                Resolution::NoCounterpartUnit => {
                    // A whole missing unit is the matcher's concern unless a
                    // consumer needs something from it.
                    if required {
                        outcome.findings.push(Finding::missing_imported(&export, None));
                    }
                }
                Resolution::Missing { counterpart } => {
                    let finding = if required {
                        Finding::missing_imported(&export, counterpart)
                    } else {
                        Finding::missing_exported(&export, counterpart)
                    };
                    outcome.findings.push(finding);
                }
                Resolution::StaleOverride(stale) => outcome.configuration_errors.push(stale),
            }
        }
        outcome
    }
}

/// Structural well-formedness of one version B unit, independent of the mapping.
fn scan_ambiguity(unit: &Unit) -> Vec<Finding> {
    let mut findings: Vec<Finding> =
        multi_tag_members(unit).map(|member| Finding::multiple_tags(unit, member)).collect();
    for (stable_name, claimants) in duplicate_claims(unit) {
        findings.extend(Finding::duplicate_name(unit, stable_name, &claimants));
    }
    findings
}

fn log_finding(finding: &Finding) {
    match finding.severity {
        Severity::Error => error!(kind = finding.kind.as_str(), unit = %finding.unit, "{finding}"),
        Severity::Warning => warn!(kind = finding.kind.as_str(), unit = %finding.unit, "{finding}"),
    }
}

/// Convenience wrapper: check with default options and an optional oracle.
pub fn check_images(
    image_a: &ProgramImage,
    image_b: &ProgramImage,
    mapping: &dyn UnitMapping,
    overrides: &OverrideTable,
    oracle: Option<&dyn ImportOracle>,
) -> Report {
    let checker = ConsistencyChecker::new(image_a, image_b, mapping, overrides);
    match oracle {
        Some(oracle) => checker.with_oracle(oracle).run(),
        None => checker.run(),
    }
}
