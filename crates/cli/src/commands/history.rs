use std::fs;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use stablemap_core::db::{ProjectContext, StoredCheckRun};
use stablemap_core::report::Report;

use crate::canonicalize_or_current;
use crate::commands::print_report;

/// List recorded check runs, oldest first.
pub fn history_command(root: &str, label: Option<&str>, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let runs = ctx.db.list_check_runs(label).context("Failed to list check runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No check runs recorded.");
        return Ok(());
    }

    println!("Check runs:");
    for run in &runs {
        let r = &run.record;
        println!(
            "- #{} {} [{}] errors: {}, warnings: {}, config: {} ({})",
            run.id,
            r.label,
            r.status.as_str(),
            r.errors,
            r.warnings,
            r.configuration_errors,
            r.finished_at
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct RunDetails {
    pub run: StoredCheckRun,
    pub report: Report,
}

/// Show one recorded run with its stored findings.
pub fn show_run_command(root: &str, id: i64, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let run = ctx
        .db
        .load_check_run(id)
        .context("Failed to load check run")?
        .ok_or_else(|| anyhow!("Check run #{} not found", id))?;
    let report = ctx.db.load_report(id).context("Failed to load check findings")?;

    if json {
        let details = RunDetails { run, report };
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    let r = &run.record;
    println!("Check run #{}", run.id);
    println!("  Label: {}", r.label);
    println!("  Status: {}", r.status.as_str());
    println!("  Old image: {} ({})", r.old_image, r.old_hash.as_deref().unwrap_or("no hash"));
    println!("  New image: {} ({})", r.new_image, r.new_hash.as_deref().unwrap_or("no hash"));
    println!("  Started: {}", r.started_at);
    println!("  Finished: {}", r.finished_at);
    println!();
    print_report(&report);
    Ok(())
}

/// Remove a recorded run, its stored findings, and its report file.
pub fn delete_run_command(root: &str, id: i64, yes: bool) -> Result<()> {
    if !yes {
        return Err(anyhow!("Refusing to delete check run #{} without --yes", id));
    }
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    let removed = ctx.db.delete_check_run(id).context("Failed to delete check run")?;
    if removed == 0 {
        return Err(anyhow!("Check run #{} not found", id));
    }

    let report_path = ctx.layout.run_report_path(id);
    if report_path.exists() {
        fs::remove_file(&report_path).with_context(|| {
            format!("Failed to remove check report at {}", report_path.display())
        })?;
    }
    println!("Deleted check run #{id}");
    Ok(())
}
