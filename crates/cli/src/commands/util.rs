use std::path::{Path, PathBuf};

use anyhow::Result;
use stablemap_core::db::{ProjectConfig, ProjectDb, ProjectLayout};
use stablemap_core::report::Report;

/// Load the project config JSON from disk (delegates to core helper).
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    stablemap_core::db::load_project_config(layout)
}

/// Resolve the DB path (respecting relative/absolute config) and open a ProjectDb (delegates to core helper).
pub fn open_project_db(layout: &ProjectLayout) -> Result<(ProjectConfig, PathBuf, ProjectDb)> {
    stablemap_core::db::open_project_db(layout)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Print a report in human-readable form: one line per finding, then totals.
pub fn print_report(report: &Report) {
    for finding in &report.findings {
        println!("[{}] {}", finding.severity.as_str(), finding);
    }
    for stale in &report.configuration_errors {
        println!("[config] {}", stale);
    }
    let summary = report.summary();
    println!(
        "{} error(s), {} warning(s), {} configuration error(s)",
        summary.errors, summary.warnings, summary.configuration_errors
    );
}
