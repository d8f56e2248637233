use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::{CheckRunRecord, CheckRunStatus, StoredCheckRun};
use crate::report::{ConfigurationError, Finding, Report};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Row kind used for configuration errors in `check_findings`.
const CONFIGURATION_ERROR_KIND: &str = "configuration_error";

/// Error type for history database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A stored finding body could not be encoded or decoded.
    #[error("Stored finding is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed check history.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for recording and querying runs.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a history database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Record a finished check run together with its findings and return the
    /// new run id.
    ///
    /// The run row and its findings are written in one transaction, so history
    /// never holds a run whose findings are missing.
    pub fn record_check_run(&self, record: &CheckRunRecord, report: &Report) -> DbResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let run_id = insert_run_row(&tx, record)?;
        insert_findings(&tx, run_id, report)?;
        tx.commit()?;
        Ok(run_id)
    }

    /// Load a single run by id.
    pub fn load_check_run(&self, id: i64) -> DbResult<Option<StoredCheckRun>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, label, old_image, new_image, old_hash, new_hash, errors, warnings, configuration_errors, status, started_at, finished_at
            FROM check_runs
            WHERE id = ?1
            "#,
        )?;
        let mut rows = stmt.query_map(params![id], map_run)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List check runs, optionally filtered by label, oldest first.
    pub fn list_check_runs(&self, label: Option<&str>) -> DbResult<Vec<StoredCheckRun>> {
        let mut stmt = if label.is_some() {
            self.conn.prepare(
                r#"
                SELECT id, label, old_image, new_image, old_hash, new_hash, errors, warnings, configuration_errors, status, started_at, finished_at
                FROM check_runs
                WHERE label = ?1
                ORDER BY id
                "#,
            )?
        } else {
            self.conn.prepare(
                r#"
                SELECT id, label, old_image, new_image, old_hash, new_hash, errors, warnings, configuration_errors, status, started_at, finished_at
                FROM check_runs
                ORDER BY id
                "#,
            )?
        };

        let rows = if let Some(label) = label {
            stmt.query_map(params![label], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Rebuild the report persisted for a run (empty if nothing was stored).
    pub fn load_report(&self, run_id: i64) -> DbResult<Report> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT kind, body FROM check_findings
            WHERE run_id = ?1
            ORDER BY idx
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut report = Report::new();
        for row in rows {
            let (kind, body) = row?;
            if kind == CONFIGURATION_ERROR_KIND {
                report.push_configuration_error(serde_json::from_str::<ConfigurationError>(&body)?);
            } else {
                report.push(serde_json::from_str::<Finding>(&body)?);
            }
        }
        Ok(report)
    }

    /// Delete a run and its findings. Returns the number of runs removed.
    pub fn delete_check_run(&self, id: i64) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM check_findings WHERE run_id = ?1", params![id])?;
        let affected = tx.execute("DELETE FROM check_runs WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(affected)
    }
}

fn insert_run_row(conn: &Connection, record: &CheckRunRecord) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO check_runs (label, old_image, new_image, old_hash, new_hash, errors, warnings, configuration_errors, status, started_at, finished_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            record.label,
            record.old_image,
            record.new_image,
            record.old_hash,
            record.new_hash,
            record.errors as i64,
            record.warnings as i64,
            record.configuration_errors as i64,
            record.status.as_str(),
            record.started_at,
            record.finished_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Findings first, then configuration errors, numbered in one sequence.
fn insert_findings(conn: &Connection, run_id: i64, report: &Report) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO check_findings (run_id, idx, kind, severity, unit, stable_name, body)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;
    for (idx, f) in report.findings.iter().enumerate() {
        stmt.execute(params![
            run_id,
            idx as i64,
            f.kind.as_str(),
            f.severity.as_str(),
            f.unit,
            f.stable_name,
            serde_json::to_string(f)?
        ])?;
    }
    let offset = report.findings.len();
    for (idx, e) in report.configuration_errors.iter().enumerate() {
        stmt.execute(params![
            run_id,
            (offset + idx) as i64,
            CONFIGURATION_ERROR_KIND,
            "error",
            e.unit,
            e.stable_name,
            serde_json::to_string(e)?
        ])?;
    }
    Ok(())
}

fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredCheckRun> {
    let status: String = row.get(9)?;
    let status = status.parse::<CheckRunStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(StoredCheckRun {
        id: row.get(0)?,
        record: CheckRunRecord {
            label: row.get(1)?,
            old_image: row.get(2)?,
            new_image: row.get(3)?,
            old_hash: row.get(4)?,
            new_hash: row.get(5)?,
            errors: row.get::<_, i64>(6)? as usize,
            warnings: row.get::<_, i64>(7)? as usize,
            configuration_errors: row.get::<_, i64>(8)? as usize,
            status,
            started_at: row.get(10)?,
            finished_at: row.get(11)?,
        },
    })
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: check_runs table
/// - 2: check_findings table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS check_runs (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                label                TEXT NOT NULL,
                old_image            TEXT NOT NULL,
                new_image            TEXT NOT NULL,
                old_hash             TEXT,
                new_hash             TEXT,
                errors               INTEGER NOT NULL DEFAULT 0,
                warnings             INTEGER NOT NULL DEFAULT 0,
                configuration_errors INTEGER NOT NULL DEFAULT 0,
                status               TEXT NOT NULL,
                started_at           TEXT NOT NULL,
                finished_at          TEXT NOT NULL
            );
            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS check_findings (
                run_id      INTEGER NOT NULL,
                idx         INTEGER NOT NULL,
                kind        TEXT NOT NULL,
                severity    TEXT NOT NULL,
                unit        TEXT NOT NULL,
                stable_name TEXT NOT NULL,
                body        TEXT NOT NULL,
                PRIMARY KEY(run_id, idx)
            );
            CREATE INDEX IF NOT EXISTS idx_check_findings_unit ON check_findings(unit);
            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
