//! The contact-store port: a durable phone → last-known-name mapping.

use crate::error::Result;
use crate::types::{ContactRecord, Timestamp};

/// Durable store of contacts the office has talked to before.
///
/// Implementations are synchronous; callers on async paths wrap calls in
/// `spawn_blocking` if contention ever warrants it.
pub trait ContactStore: Send + Sync {
    /// Looks up a contact by bare phone number.
    fn lookup(&self, phone: &str) -> Result<Option<ContactRecord>>;

    /// Inserts or refreshes a contact. The stored name and last-contact
    /// time always reflect the most recent completed intake.
    fn upsert(&self, phone: &str, display_name: &str, at: Timestamp) -> Result<()>;
}
