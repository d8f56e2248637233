use std::fs;

use crate::commands::{open_project_db, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};
use anyhow::{Context, Result};
use serde::Serialize;
use stablemap_core::db::{CheckInputs, ProjectConfig, ProjectDb, ProjectLayout, StoredCheckRun};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub inputs: CheckInputs,
    pub deny_warnings: bool,
    pub parallel: bool,
    pub layout: ProjectInfoLayout,
    pub run_count: usize,
    pub last_run: Option<StoredCheckRun>,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub reports_dir: String,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    let db_path_rel = layout.db_path_relative_string();
    let config = ProjectConfig::new(&project_name, db_path_rel);

    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the history database immediately so follow-on commands can rely on it.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized stablemap project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let (config, _db_path, db) = open_project_db(&layout)?;
    let runs = db.list_check_runs(None).context("Failed to list check runs")?;
    let run_count = runs.len();
    let last_run = runs.into_iter().last();

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: config.name.clone(),
            root: layout.root.display().to_string(),
            config_file: layout.project_config_path.display().to_string(),
            config_version: config.config_version.clone(),
            db_path: config.db.path.clone(),
            inputs: config.inputs.clone(),
            deny_warnings: config.deny_warnings,
            parallel: config.parallel,
            layout: ProjectInfoLayout {
                meta_dir: layout.meta_dir.display().to_string(),
                reports_dir: layout.reports_dir.display().to_string(),
            },
            run_count,
            last_run,
        };
        let serialized = serde_json::to_string_pretty(&snapshot)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("stablemap Project Info");
    println!("======================");
    println!("Name: {}", config.name);
    println!("Root: {}", layout.root.display());
    println!("Config file: {}", layout.project_config_path.display());
    println!("Config version: {}", config.config_version);
    println!("DB path (config): {}", config.db.path);
    println!("Deny warnings: {}", config.deny_warnings);
    println!("Parallel: {}", config.parallel);
    println!();

    println!("Default inputs:");
    let inputs = &config.inputs;
    for (label, value) in [
        ("Old image", &inputs.old_image),
        ("New image", &inputs.new_image),
        ("Mapping", &inputs.mapping),
        ("Overrides", &inputs.overrides),
        ("Contract", &inputs.contract),
    ] {
        println!("- {label}: {}", value.as_deref().unwrap_or("(not set)"));
    }
    println!();

    println!("Directories:");
    print_dir_status("Meta dir (.stablemap)", &layout.meta_dir);
    print_dir_status("Reports dir", &layout.reports_dir);
    println!();

    println!("Check runs: {}", run_count);
    if let Some(run) = last_run {
        let summary = run.record.summary();
        println!(
            "Last run: #{} {} [{}] {} error(s), {} warning(s), {} configuration error(s)",
            run.id,
            run.record.label,
            run.record.status.as_str(),
            summary.errors,
            summary.warnings,
            summary.configuration_errors
        );
    }

    Ok(())
}
