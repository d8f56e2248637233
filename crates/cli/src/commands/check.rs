use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;
use stablemap_core::check::{CheckOptions, ConsistencyChecker};
use stablemap_core::db::{
    resolve_project_path, CheckRunRecord, CheckRunStatus, ProjectConfig, ProjectContext,
    ProjectLayout,
};
use stablemap_core::imports::ConsumerContract;
use stablemap_core::mapping::MappingTable;
use stablemap_core::model::ProgramImage;
use stablemap_core::overrides::OverrideTable;
use stablemap_core::report::{Report, ReportSummary};
use tracing::{debug, info, warn};

use crate::commands::{load_project_config, print_report};
use crate::{canonicalize_or_current, sha256_file};

/// Inputs and switches for one `check` invocation.
///
/// Paths set here win over the project's configured inputs; unset ones fall
/// back to `.stablemap/project.json` when the root is an initialized project.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub old_image: Option<String>,
    pub new_image: Option<String>,
    pub mapping: Option<String>,
    pub overrides: Option<String>,
    pub contract: Option<String>,
    /// Label stored with the run; defaults to `<old>..<new>`.
    pub label: Option<String>,
    pub deny_warnings: bool,
    pub sequential: bool,
    pub no_record: bool,
    pub json: bool,
}

/// Result of a `check` invocation, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    pub label: String,
    /// History row id, when the run was recorded.
    pub run_id: Option<i64>,
    pub passed: bool,
    pub deny_warnings: bool,
    pub summary: ReportSummary,
    pub report: Report,
}

/// Input paths after applying CLI > config precedence.
#[derive(Debug)]
struct ResolvedInputs {
    old_image: PathBuf,
    new_image: PathBuf,
    mapping: Option<PathBuf>,
    overrides: Option<PathBuf>,
    contract: Option<PathBuf>,
}

fn pick(cli: &Option<String>, configured: &Option<String>, layout: &ProjectLayout) -> Option<PathBuf> {
    match (cli, configured) {
        (Some(path), _) => Some(PathBuf::from(path)),
        (None, Some(path)) => Some(resolve_project_path(layout, path)),
        (None, None) => None,
    }
}

fn resolve_inputs(
    request: &CheckRequest,
    config: Option<&ProjectConfig>,
    layout: &ProjectLayout,
) -> Result<ResolvedInputs> {
    let defaults = config.map(|c| c.inputs.clone()).unwrap_or_default();
    let old_image = pick(&request.old_image, &defaults.old_image, layout).ok_or_else(|| {
        anyhow!("No old image given (pass --old or set inputs.old_image in the project config)")
    })?;
    let new_image = pick(&request.new_image, &defaults.new_image, layout).ok_or_else(|| {
        anyhow!("No new image given (pass --new or set inputs.new_image in the project config)")
    })?;
    Ok(ResolvedInputs {
        old_image,
        new_image,
        mapping: pick(&request.mapping, &defaults.mapping, layout),
        overrides: pick(&request.overrides, &defaults.overrides, layout),
        contract: pick(&request.contract, &defaults.contract, layout),
    })
}

fn image_label(image: &ProgramImage, path: &Path) -> String {
    image
        .name()
        .map(str::to_string)
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .unwrap_or_else(|| path.display().to_string())
}

/// Check the old image against the new one and optionally record the run.
///
/// Returns the outcome even when the check fails; the caller decides the exit
/// status from `CheckOutcome::passed`.
pub fn check_command(root: &str, request: &CheckRequest) -> Result<CheckOutcome> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let config = if layout.is_initialized() { Some(load_project_config(&layout)?) } else { None };
    let inputs = resolve_inputs(request, config.as_ref(), &layout)?;
    debug!(?inputs, "resolved check inputs");

    let old_image = ProgramImage::load(&inputs.old_image)?;
    let new_image = ProgramImage::load(&inputs.new_image)?;
    let mapping = match &inputs.mapping {
        Some(path) => MappingTable::load(path)?,
        None => {
            warn!("no unit mapping given; only static members can resolve");
            MappingTable::new()
        }
    };
    let overrides = match &inputs.overrides {
        Some(path) => OverrideTable::load(path)?,
        None => OverrideTable::empty(),
    };
    let contract = inputs.contract.as_deref().map(ConsumerContract::load).transpose()?;

    let deny_warnings = request.deny_warnings || config.as_ref().is_some_and(|c| c.deny_warnings);
    let parallel = !request.sequential && config.as_ref().map_or(true, |c| c.parallel);
    let label = request.label.clone().unwrap_or_else(|| {
        format!(
            "{}..{}",
            image_label(&old_image, &inputs.old_image),
            image_label(&new_image, &inputs.new_image)
        )
    });

    let started_at = Utc::now().to_rfc3339();
    let mut checker = ConsistencyChecker::new(&old_image, &new_image, &mapping, &overrides)
        .with_options(CheckOptions { parallel });
    if let Some(contract) = &contract {
        checker = checker.with_oracle(contract);
    }
    let report = checker.run();
    let finished_at = Utc::now().to_rfc3339();
    let passed = report.passed(deny_warnings);

    let run_id = match &config {
        Some(_) if !request.no_record => {
            fs::create_dir_all(&layout.reports_dir).with_context(|| {
                format!("Failed to create reports dir: {}", layout.reports_dir.display())
            })?;
            let ctx = ProjectContext::from_root(&root_path)?;
            let summary = report.summary();
            let record = CheckRunRecord {
                label: label.clone(),
                old_image: inputs.old_image.display().to_string(),
                new_image: inputs.new_image.display().to_string(),
                old_hash: Some(sha256_file(&inputs.old_image)?),
                new_hash: Some(sha256_file(&inputs.new_image)?),
                errors: summary.errors,
                warnings: summary.warnings,
                configuration_errors: summary.configuration_errors,
                status: CheckRunStatus::from_passed(passed),
                started_at,
                finished_at,
            };
            let id =
                ctx.db.record_check_run(&record, &report).context("Failed to record check run")?;

            // The history row is only kept once its report file is on disk.
            let report_path = ctx.layout.run_report_path(id);
            let written = serde_json::to_string_pretty(&report)
                .map_err(anyhow::Error::from)
                .and_then(|body| {
                    fs::write(&report_path, body).with_context(|| {
                        format!("Failed to write check report at {}", report_path.display())
                    })
                });
            if let Err(err) = written {
                if let Err(cleanup) = ctx.db.delete_check_run(id) {
                    warn!(run_id = id, error = %cleanup, "failed to drop unfinished check run");
                }
                return Err(err);
            }
            info!(run_id = id, label = %label, "recorded check run");
            Some(id)
        }
        _ => None,
    };

    let outcome =
        CheckOutcome { label, run_id, passed, deny_warnings, summary: report.summary(), report };

    if request.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Check {}", outcome.label);
        print_report(&outcome.report);
        if let Some(id) = outcome.run_id {
            println!("Recorded as run #{id}");
        }
        println!("Result: {}", if outcome.passed { "PASSED" } else { "FAILED" });
    }

    Ok(outcome)
}
