//! Project layout, configuration, and check-run history.
//!
//! A project is a directory holding a `.stablemap/` metadata folder with:
//! - `project.json`: default inputs and options for `check`.
//! - `history.db`: a SQLite database of past check runs and their findings.
//!
//! This module defines:
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectConfig`: serializable project metadata and default inputs.
//! - `ProjectDb`: a small SQLite wrapper with versioned schema.
//! - Record types (`CheckRunRecord`, `StoredCheckRun`) stored in the database.

pub mod config;
pub mod context;
pub mod layout;
pub mod models;
pub mod project_db;
pub mod util;

pub use config::{CheckInputs, DbConfig, ProjectConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{CheckRunRecord, CheckRunStatus, StoredCheckRun};
pub use project_db::{DbError, DbResult, ProjectDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db, resolve_project_path};
