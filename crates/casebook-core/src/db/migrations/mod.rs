//! Versioned schema steps for the case database.
//!
//! `PRAGMA user_version` is the source of truth; `store_meta` mirrors it for
//! tools that read the file without SQLite pragmas.

use super::schema;
use rusqlite::{Connection, Transaction, ffi, types::Type};

/// One forward-only schema step.
struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "tables",
        sql: schema::MIGRATION_V1_SQL,
    },
    Step {
        version: 2,
        name: "listing indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Read `PRAGMA user_version`.
///
/// # Errors
///
/// Returns an error if SQLite fails or the stored value is negative or
/// larger than `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Bring the schema up to [`LATEST_SCHEMA_VERSION`] and return it.
///
/// Steps at or below the stored version are skipped, so a migrated database
/// is left untouched. Each step commits on its own.
///
/// # Errors
///
/// Returns an error if a step fails, or if the database was written by a
/// newer schema than this binary knows.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let stored = current_schema_version(conn)?;
    if stored > LATEST_SCHEMA_VERSION {
        return Err(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_MISMATCH),
            Some(format!(
                "case database is at schema v{stored}; this build supports up to v{LATEST_SCHEMA_VERSION}"
            )),
        ));
    }

    for step in STEPS.iter().filter(|step| step.version > stored) {
        let tx = conn.transaction()?;
        apply(&tx, step)?;
        tx.commit()?;
        tracing::debug!(version = step.version, step = step.name, "schema step applied");
    }

    Ok(LATEST_SCHEMA_VERSION)
}

fn apply(tx: &Transaction<'_>, step: &Step) -> rusqlite::Result<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", i64::from(step.version))?;
    tx.execute(
        "INSERT INTO store_meta (id, schema_version) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET schema_version = excluded.schema_version",
        [i64::from(step.version)],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LATEST_SCHEMA_VERSION, current_schema_version, migrate};
    use crate::db::schema;
    use rusqlite::{Connection, params};

    fn sqlite_object_exists(
        conn: &Connection,
        object_type: &str,
        object_name: &str,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            )",
            params![object_type, object_name],
            |row| row.get(0),
        )
    }

    #[test]
    fn migrate_empty_db_to_latest() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION);

        for table in [
            "users",
            "cases",
            "case_evidence",
            "case_hearings",
            "case_access",
            "notifications",
            "store_meta",
        ] {
            assert!(sqlite_object_exists(&conn, "table", table)?, "missing table {table}");
        }

        for index in schema::REQUIRED_INDEXES {
            assert!(
                sqlite_object_exists(&conn, "index", index)?,
                "missing expected index {index}"
            );
        }

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let meta_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM store_meta", [], |row| row.get(0))?;
        assert_eq!(meta_rows, 1);

        let schema_version: i64 = conn.query_row(
            "SELECT schema_version FROM store_meta WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(schema_version, i64::from(LATEST_SCHEMA_VERSION));

        Ok(())
    }

    #[test]
    fn migrate_upgrades_from_v1_keeping_rows() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        conn.execute_batch(schema::MIGRATION_V1_SQL)?;
        conn.pragma_update(None, "user_version", 1_i64)?;
        conn.execute(
            "INSERT INTO cases (
                case_id, case_number, title, description, category,
                client_id, lawyer_id, status, created_at_us, updated_at_us
            ) VALUES (
                'c-1', 'CASE-1', 'Dispute', 'Fence line', 'civil',
                'u-client', NULL, 'filed', 1, 1
            )",
            [],
        )?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn schema_rejects_lawyer_without_specialization() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrate(&mut conn)?;

        let result = conn.execute(
            "INSERT INTO users (user_id, name, role, specialization, created_at_us)
             VALUES ('l-1', 'Ada', 'lawyer', NULL, 1)",
            [],
        );
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn steps_end_at_latest_version() {
        let versions: Vec<u32> = super::STEPS.iter().map(|step| step.version).collect();
        assert_eq!(versions, (1..=LATEST_SCHEMA_VERSION).collect::<Vec<_>>());
    }

    #[test]
    fn newer_database_is_refused() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "user_version", i64::from(LATEST_SCHEMA_VERSION + 1))?;

        let err = migrate(&mut conn).unwrap_err();
        assert!(err.to_string().contains("this build supports up to"));
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION + 1);
        Ok(())
    }
}
