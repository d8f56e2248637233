use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use stablemap::commands::{
    check_command, delete_run_command, exports_command, history_command, init_project_command,
    overrides_command, project_info_command, show_run_command, CheckRequest,
};
use tracing_subscriber::EnvFilter;

/// Stable-name integrity checker for structural mappings between program image versions.
///
/// This CLI is a thin wrapper around `stablemap-core` (exposed in code as `stablemap_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "stablemap",
    version,
    about = "Stable-name integrity checker for program image mappings",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new stablemap project at the given root.
    ///
    /// This will:
    /// - Create a `.stablemap` metadata directory and a `reports` directory.
    /// - Write a `.stablemap/project.json` config file.
    /// - Create the check history database.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing stablemap project.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Check that every stable name of the old image survives in the new one.
    ///
    /// Inputs not given on the command line are taken from the project config.
    /// Exits non-zero on errors, stale overrides, or (with `--deny-warnings`) warnings.
    Check {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Old (annotated) image document.
        #[arg(long = "old")]
        old_image: Option<String>,

        /// New image document.
        #[arg(long = "new")]
        new_image: Option<String>,

        /// Unit mapping document (old unit -> new unit).
        #[arg(long)]
        mapping: Option<String>,

        /// Override table document.
        #[arg(long)]
        overrides: Option<String>,

        /// Consumer contract listing imported stable names.
        #[arg(long)]
        contract: Option<String>,

        /// Label stored with the run. Defaults to `<old>..<new>`.
        #[arg(long)]
        label: Option<String>,

        /// Treat warnings as failures.
        #[arg(long, default_value_t = false)]
        deny_warnings: bool,

        /// Run on a single thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Do not record the run in the project history.
        #[arg(long, default_value_t = false)]
        no_record: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the exported members (symbol table) of one image.
    Exports {
        /// Image document to inspect.
        #[arg(long)]
        image: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Validate an override table and list its entries.
    Overrides {
        /// Override table document.
        #[arg(long)]
        file: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List recorded check runs.
    History {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Only show runs with this label.
        #[arg(long)]
        label: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show a recorded check run and its findings.
    ShowRun {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Run id as listed by `history`.
        #[arg(long)]
        id: i64,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete a recorded check run and its report file.
    DeleteRun {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Run id as listed by `history`.
        #[arg(long)]
        id: i64,

        /// Confirm deletion.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::Check {
            root,
            old_image,
            new_image,
            mapping,
            overrides,
            contract,
            label,
            deny_warnings,
            sequential,
            no_record,
            json,
        } => {
            let request = CheckRequest {
                old_image,
                new_image,
                mapping,
                overrides,
                contract,
                label,
                deny_warnings,
                sequential,
                no_record,
                json,
            };
            let outcome = check_command(&root, &request)?;
            if !outcome.passed {
                let s = outcome.summary;
                return Err(anyhow!(
                    "Integrity check failed: {} error(s), {} warning(s), {} configuration error(s)",
                    s.errors,
                    s.warnings,
                    s.configuration_errors
                ));
            }
        }
        Command::Exports { image, json } => exports_command(&image, json)?,
        Command::Overrides { file, json } => overrides_command(&file, json)?,
        Command::History { root, label, json } => history_command(&root, label.as_deref(), json)?,
        Command::ShowRun { root, id, json } => show_run_command(&root, id, json)?,
        Command::DeleteRun { root, id, yes } => delete_run_command(&root, id, yes)?,
    }

    Ok(())
}
