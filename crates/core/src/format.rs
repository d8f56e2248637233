//! Loading of the JSON/YAML documents the checker consumes.
//!
//! Program images, mappings, override tables and consumer contracts all arrive
//! as small structured documents. The format is picked from the file extension:
//! `.json` is parsed as JSON, everything else as YAML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Serialization format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Json => "JSON",
            DocumentFormat::Yaml => "YAML",
        }
    }
}

/// Parse a document body in the given format.
pub fn parse_document<T: DeserializeOwned>(body: &str, format: DocumentFormat) -> Result<T> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str(body)?,
        DocumentFormat::Yaml => serde_yaml::from_str(body)?,
    };
    Ok(parsed)
}

/// Read and parse a document from disk.
///
/// `what` names the document in error messages (e.g. "program image").
pub fn load_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} at {}", path.display()))?;
    let format = DocumentFormat::from_path(path);
    parse_document(&body, format).with_context(|| {
        format!("Failed to parse {what} {} at {}", format.as_str(), path.display())
    })
}
