//! stablemap-core
//!
//! Core library for checking that the stable export names declared on members
//! of one program image version survive into the next version, given a
//! unit-to-unit mapping produced by an external matcher.
//!
//! This crate defines the artifact model (units and members), the symbol table
//! builder, the override table, the resolver, the consistency checker and its
//! report, plus the project layout and the SQLite run history used by frontends.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends.

pub mod check;
pub mod db;
pub mod exports;
pub mod format;
pub mod imports;
pub mod mapping;
pub mod model;
pub mod overrides;
pub mod report;
pub mod resolve;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
