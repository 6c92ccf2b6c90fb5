//! Database schema migrations.
//!
//! Applies the initial schema: the contacts table plus the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use intake_core::error::IntakeError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), IntakeError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| IntakeError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| IntakeError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), IntakeError> {
    conn.execute_batch(
        "
        -- Known contacts, keyed by bare phone number.
        CREATE TABLE IF NOT EXISTS contacts (
            phone            TEXT PRIMARY KEY NOT NULL,
            display_name     TEXT NOT NULL,
            last_contact_at  INTEGER NOT NULL,
            created_at       INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_contacts_last_contact
            ON contacts (last_contact_at DESC);

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| IntakeError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_contacts_table_exists() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO contacts (phone, display_name, last_contact_at)
             VALUES ('5511987654321', 'Maria', 1700000000)",
            [],
        )
        .unwrap();

        let name: String = conn
            .query_row(
                "SELECT display_name FROM contacts WHERE phone = '5511987654321'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "Maria");
    }

    #[test]
    fn test_contacts_phone_is_primary_key() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO contacts (phone, display_name, last_contact_at)
             VALUES ('551', 'A', 1)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO contacts (phone, display_name, last_contact_at)
             VALUES ('551', 'B', 2)",
            [],
        );
        assert!(result.is_err());
    }
}
