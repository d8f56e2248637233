use serde::{Deserialize, Serialize};

use crate::report::ReportSummary;

/// Outcome of a recorded check run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckRunStatus {
    Passed,
    Failed,
}

impl CheckRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckRunStatus::Passed => "passed",
            CheckRunStatus::Failed => "failed",
        }
    }

    pub fn from_passed(passed: bool) -> Self {
        if passed {
            CheckRunStatus::Passed
        } else {
            CheckRunStatus::Failed
        }
    }
}

impl std::str::FromStr for CheckRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passed" => Ok(CheckRunStatus::Passed),
            "failed" => Ok(CheckRunStatus::Failed),
            other => Err(format!("Invalid check run status '{other}'. Allowed: passed, failed")),
        }
    }
}

/// Record describing one check run for bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRunRecord {
    /// Free-form label (typically "<old>..<new>").
    pub label: String,
    pub old_image: String,
    pub new_image: String,
    /// SHA-256 of the image documents, if computed.
    pub old_hash: Option<String>,
    pub new_hash: Option<String>,
    pub errors: usize,
    pub warnings: usize,
    pub configuration_errors: usize,
    pub status: CheckRunStatus,
    pub started_at: String,
    pub finished_at: String,
}

impl CheckRunRecord {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            errors: self.errors,
            warnings: self.warnings,
            configuration_errors: self.configuration_errors,
        }
    }
}

/// A check run record as stored, with its row id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCheckRun {
    pub id: i64,
    #[serde(flatten)]
    pub record: CheckRunRecord,
}
