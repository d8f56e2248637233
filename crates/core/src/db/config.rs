use serde::{Deserialize, Serialize};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the history database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Default input documents for `check`, relative to the project root unless absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
}

fn default_parallel() -> bool {
    true
}

/// Serializable configuration describing a stablemap project.
///
/// This lives at `.stablemap/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not image versions.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    #[serde(default)]
    pub inputs: CheckInputs,
    /// Treat warnings as failures.
    #[serde(default)]
    pub deny_warnings: bool,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            inputs: CheckInputs::default(),
            deny_warnings: false,
            parallel: true,
        }
    }
}
