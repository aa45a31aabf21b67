//! Opening the case database.
//!
//! File-backed stores run with `journal_mode = WAL`, `synchronous = NORMAL`
//! and a 5s busy timeout so concurrent `cb` processes queue rather than
//! fail. Every connection enforces foreign keys, which is what removes a
//! case's evidence, hearings and grants along with it.

pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, types::Type};
use std::{path::Path, time::Duration};
use tracing::{debug, warn};

/// Busy timeout used for case store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the case database at `path` and migrate it.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the
/// database cannot be opened, configured, or migrated.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create case database directory {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("open case database {}", path.display()))?;
    let conn = prepare(conn, true)
        .with_context(|| format!("prepare case database {}", path.display()))?;
    Ok(conn)
}

/// Open a migrated in-memory database with foreign keys enabled.
///
/// # Errors
///
/// Returns an error if SQLite cannot open or migrate the database.
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    prepare(Connection::open_in_memory()?, false)
}

fn prepare(mut conn: Connection, file_backed: bool) -> rusqlite::Result<Connection> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    if file_backed {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!(%mode, "case database is not in WAL mode");
        }
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    }
    let version = migrations::migrate(&mut conn)?;
    debug!(version, file_backed, "case database ready");
    Ok(conn)
}

pub(crate) fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_micros(column: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            format!("timestamp out of range: {micros}").into(),
        )
    })
}

/// Parse a text column into one of the model enums.
pub(crate) fn parse_column<T>(column: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error)))
}
