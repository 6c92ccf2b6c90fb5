//! Contact repository: the durable phone → name mapping behind the
//! returning-contact fast path.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use intake_core::error::{IntakeError, Result};
use intake_core::store::ContactStore;
use intake_core::types::{ContactRecord, Timestamp};

use crate::db::Database;

/// SQLite-backed implementation of [`ContactStore`].
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: Arc<Database>,
}

impl ContactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Total number of known contacts.
    pub fn count(&self) -> Result<i64> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
                .map_err(|e| IntakeError::Storage(format!("Failed to count contacts: {}", e)))
        })
    }
}

impl ContactStore for ContactRepository {
    fn lookup(&self, phone: &str) -> Result<Option<ContactRecord>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT display_name, last_contact_at FROM contacts WHERE phone = ?1",
                params![phone],
                |row| {
                    Ok(ContactRecord {
                        display_name: row.get(0)?,
                        last_contact_at: Timestamp(row.get(1)?),
                    })
                },
            )
            .optional()
            .map_err(|e| IntakeError::Storage(format!("Failed to look up contact: {}", e)))
        })
    }

    fn upsert(&self, phone: &str, display_name: &str, at: Timestamp) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (phone, display_name, last_contact_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (phone) DO UPDATE SET
                     display_name = excluded.display_name,
                     last_contact_at = excluded.last_contact_at",
                params![phone, display_name, at.0],
            )
            .map_err(|e| IntakeError::Storage(format!("Failed to upsert contact: {}", e)))?;
            debug!(phone, display_name, "Contact upserted");
            Ok(())
        })
    }
}
