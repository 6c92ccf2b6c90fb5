//! Per-contact conversation sessions and the in-memory store.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use intake_core::error::{IntakeError, Result};
use intake_core::types::{ContactId, Timestamp};

// ============================================================================
// Step
// ============================================================================

/// Where a contact currently is in the intake conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Session exists but the contact has not sent a greeting yet.
    Greeting,
    /// Known contact chooses: continue the previous matter or start fresh.
    ReturningMenu,
    AwaitingName,
    AwaitingDepartment,
    AwaitingReason,
    AwaitingScheduling,
    /// Intake finished; further messages are ignored until reset or expiry.
    Completed,
}

impl Step {
    /// Whether the contact is mid-conversation: they have received a prompt
    /// that awaits an answer. `Greeting` (never replied to) and `Completed`
    /// sessions expire silently.
    pub fn is_engaged(self) -> bool {
        !matches!(self, Step::Greeting | Step::Completed)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Greeting => "greeting",
            Step::ReturningMenu => "returning_menu",
            Step::AwaitingName => "awaiting_name",
            Step::AwaitingDepartment => "awaiting_department",
            Step::AwaitingReason => "awaiting_reason",
            Step::AwaitingScheduling => "awaiting_scheduling",
            Step::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Step {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "greeting" => Ok(Step::Greeting),
            "returning_menu" => Ok(Step::ReturningMenu),
            "awaiting_name" => Ok(Step::AwaitingName),
            "awaiting_department" => Ok(Step::AwaitingDepartment),
            "awaiting_reason" => Ok(Step::AwaitingReason),
            "awaiting_scheduling" => Ok(Step::AwaitingScheduling),
            "completed" => Ok(Step::Completed),
            _ => Err(IntakeError::Flow(format!("Invalid step: {}", s))),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One contact's in-flight intake conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub contact: ContactId,
    pub step: Step,
    /// First name collected at `AwaitingName` (or recalled from the
    /// contact store for returning contacts).
    pub client_name: String,
    pub department_key: Option<u32>,
    pub reason: String,
    pub started_at: Timestamp,
    pub last_activity: Timestamp,
    /// Set once the idle sweeper has warned this session in the current
    /// idle period; cleared on the next message.
    pub idle_warned: bool,
}

impl Session {
    pub fn new(contact: ContactId, step: Step, now: Timestamp) -> Self {
        Self {
            contact,
            step,
            client_name: String::new(),
            department_key: None,
            reason: String::new(),
            started_at: now,
            last_activity: now,
            idle_warned: false,
        }
    }

    /// Records activity: refreshes the idle clock and re-arms the warning.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_activity = now;
        self.idle_warned = false;
    }

    pub fn idle_secs(&self, now: Timestamp) -> i64 {
        self.last_activity.elapsed_until(now)
    }
}

/// How a decision changes the stored session.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    Put(Session),
    Delete,
    Unchanged,
}

// ============================================================================
// SessionStore
// ============================================================================

/// Thread-safe in-memory session map, keyed by the raw contact id.
///
/// Sessions are deliberately not persisted: a restart drops in-flight
/// conversations, which simply re-greet on the next message.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|e| IntakeError::Flow(format!("Session store lock poisoned: {}", e)))
    }

    pub fn get(&self, id: &ContactId) -> Result<Option<Session>> {
        Ok(self.lock()?.get(id.as_raw()).cloned())
    }

    pub fn put(&self, session: Session) -> Result<()> {
        self.lock()?
            .insert(session.contact.as_raw().to_string(), session);
        Ok(())
    }

    pub fn delete(&self, id: &ContactId) -> Result<bool> {
        Ok(self.lock()?.remove(id.as_raw()).is_some())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Runs a decision against the current session and applies its update,
    /// all under one lock acquisition. The closure must not block.
    pub fn resolve<T, F>(&self, id: &ContactId, f: F) -> Result<T>
    where
        F: FnOnce(Option<&Session>) -> (SessionUpdate, T),
    {
        let mut map = self.lock()?;
        let (update, out) = f(map.get(id.as_raw()));
        match update {
            SessionUpdate::Put(session) => {
                map.insert(id.as_raw().to_string(), session);
            }
            SessionUpdate::Delete => {
                map.remove(id.as_raw());
            }
            SessionUpdate::Unchanged => {}
        }
        Ok(out)
    }

    /// Sessions idle past the warning threshold that have not been warned
    /// yet. Marks them warned and returns clones for messaging. Only
    /// engaged sessions are warned.
    pub fn warn_candidates(&self, now: Timestamp, warn_after_secs: i64) -> Result<Vec<Session>> {
        let mut map = self.lock()?;
        let mut out = Vec::new();
        for session in map.values_mut() {
            if session.step.is_engaged()
                && !session.idle_warned
                && session.idle_secs(now) >= warn_after_secs
            {
                session.idle_warned = true;
                out.push(session.clone());
            }
        }
        Ok(out)
    }

    /// Removes and returns every session idle past the expiry threshold.
    pub fn sweep_expired(&self, now: Timestamp, ttl_secs: i64) -> Result<Vec<Session>> {
        let mut map = self.lock()?;
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, s)| s.idle_secs(now) >= ttl_secs)
            .map(|(k, _)| k.clone())
            .collect();
        let mut out = Vec::with_capacity(expired.len());
        for key in expired {
            if let Some(session) = map.remove(&key) {
                out.push(session);
            }
        }
        Ok(out)
    }
}
