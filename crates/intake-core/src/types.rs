//! Core domain types shared across the intake crates.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{IntakeError, Result};

// ============================================================================
// Timestamp
// ============================================================================

/// Seconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Seconds elapsed from `self` to `later` (zero if `later` is earlier).
    pub fn elapsed_until(&self, later: Timestamp) -> i64 {
        (later.0 - self.0).max(0)
    }

    /// RFC 3339 rendering for notification payloads and logs.
    pub fn to_rfc3339(&self) -> String {
        match Utc.timestamp_opt(self.0, 0).single() {
            Some(dt) => dt.to_rfc3339(),
            None => self.0.to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

// ============================================================================
// ContactId
// ============================================================================

/// A contact identifier as delivered by the messaging channel.
///
/// Raw identifiers carry a channel suffix (`5511999990000@c.us`); `digits()`
/// strips the suffix and any non-digit characters, yielding the stable key
/// used for contact storage and chat links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier exactly as the channel delivered it.
    pub fn as_raw(&self) -> &str {
        &self.0
    }

    /// The bare phone number: everything before the channel suffix, digits
    /// only.
    pub fn digits(&self) -> String {
        let bare = match self.0.find('@') {
            Some(idx) => &self.0[..idx],
            None => self.0.as_str(),
        };
        bare.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// Click-to-chat link for this contact.
    pub fn chat_link(&self) -> String {
        format!("https://wa.me/{}", self.digits())
    }

    /// Whether this identifier names a group rather than an individual.
    pub fn is_group(&self) -> bool {
        self.0.ends_with("@g.us")
    }

    /// Whether this identifier is a status/broadcast feed.
    pub fn is_broadcast(&self) -> bool {
        self.0.contains("status") || self.0.contains("broadcast")
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContactId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for ContactId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// ============================================================================
// Departments
// ============================================================================

/// One selectable practice area in the intake menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// The digit a contact types to select this department.
    pub key: u32,
    pub label: String,
    /// Channel identifier of the staff inbox that receives this
    /// department's leads.
    pub recipient_id: String,
}

/// The configured department table, validated at startup.
#[derive(Debug, Clone)]
pub struct DepartmentDirectory {
    departments: Vec<Department>,
    general_key: u32,
}

impl DepartmentDirectory {
    /// Builds a directory, rejecting duplicate keys, the reserved key `0`,
    /// and a `general_key` that names no entry.
    pub fn new(departments: Vec<Department>, general_key: u32) -> Result<Self> {
        if departments.is_empty() {
            return Err(IntakeError::Config(
                "department table must not be empty".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for dept in &departments {
            if dept.key == 0 {
                return Err(IntakeError::Config(format!(
                    "department '{}' uses reserved key 0",
                    dept.label
                )));
            }
            if !seen.insert(dept.key) {
                return Err(IntakeError::Config(format!(
                    "duplicate department key {}",
                    dept.key
                )));
            }
        }
        if !seen.contains(&general_key) {
            return Err(IntakeError::Config(format!(
                "general_key {} matches no department",
                general_key
            )));
        }
        Ok(Self {
            departments,
            general_key,
        })
    }

    pub fn lookup(&self, key: u32) -> Option<&Department> {
        self.departments.iter().find(|d| d.key == key)
    }

    /// The fallback department for contacts who skip the menu.
    pub fn general(&self) -> &Department {
        // Validated in `new`; the general key always resolves.
        self.departments
            .iter()
            .find(|d| d.key == self.general_key)
            .unwrap_or(&self.departments[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Department> {
        self.departments.iter()
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    /// Renders the numbered menu body, one `*key* - label` line per entry.
    pub fn render_menu(&self) -> String {
        self.departments
            .iter()
            .map(|d| format!("*{}* - {}", d.key, d.label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parses a free-text reply as a menu selection. Only the digits in the
    /// reply are considered; anything that is not a configured key (including
    /// `0`) is rejected.
    pub fn parse_selection(&self, text: &str) -> Option<&Department> {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() || digits.len() > 3 {
            return None;
        }
        let key: u32 = digits.parse().ok()?;
        self.lookup(key)
    }
}

// ============================================================================
// Contact & intake records
// ============================================================================

/// A previously seen contact, as persisted by the contact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub display_name: String,
    pub last_contact_at: Timestamp,
}

/// A completed intake, ready for alerting and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: Uuid,
    /// Bare phone number (channel suffix already stripped).
    pub phone: String,
    pub name: String,
    pub reason: String,
    pub department_label: String,
    /// Routing target for the alert message.
    pub department_recipient: String,
    pub timestamp: Timestamp,
    /// `None` when the flow skipped the scheduling question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<bool>,
}

impl IntakeRecord {
    pub fn new(
        phone: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
        department: &Department,
        timestamp: Timestamp,
        scheduled: Option<bool>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone: phone.into(),
            name: name.into(),
            reason: reason.into(),
            department_label: department.label.clone(),
            department_recipient: department.recipient_id.clone(),
            timestamp,
            scheduled,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
