//! The intake state machine.
//!
//! [`IntakeMachine::advance`] is a pure decision function: given the current
//! session (if any), the trimmed message text, the clock, and what the
//! contact store knows about the sender, it returns how the session changes,
//! which replies to send, and whether an intake completed. All side effects
//! stay with the caller.

use chrono::{TimeZone, Timelike};

use intake_core::config::{HoursConfig, IntakeConfig, MessageCatalog};
use intake_core::error::Result;
use intake_core::types::{
    ContactId, ContactRecord, Department, DepartmentDirectory, IntakeRecord, Timestamp,
};

use crate::patterns::KeywordSet;
use crate::session::{Session, SessionUpdate, Step};

/// The outcome of advancing a session by one inbound message.
#[derive(Debug, Clone)]
pub struct Decision {
    pub update: SessionUpdate,
    pub replies: Vec<String>,
    /// Present exactly when this message completed the intake.
    pub completed: Option<IntakeRecord>,
}

impl Decision {
    fn reply(update: SessionUpdate, text: String) -> Self {
        Self {
            update,
            replies: vec![text],
            completed: None,
        }
    }
}

/// Pure decision core of the intake flow.
pub struct IntakeMachine {
    keywords: KeywordSet,
    directory: DepartmentDirectory,
    messages: MessageCatalog,
    hours: HoursConfig,
    office_name: String,
    scheduling_link: String,
    min_name_len: usize,
}

impl IntakeMachine {
    pub fn new(config: &IntakeConfig) -> Result<Self> {
        Ok(Self {
            keywords: KeywordSet::new(),
            directory: config.departments.directory()?,
            messages: config.messages.clone(),
            hours: config.hours.clone(),
            office_name: config.general.office_name.clone(),
            scheduling_link: config.notify.scheduling_link.clone(),
            min_name_len: config.session.min_name_len,
        })
    }

    /// Advances one contact's conversation by one message.
    ///
    /// `text` must already be trimmed and non-empty; `known` is the contact
    /// store's record for this sender, if any.
    pub fn advance(
        &self,
        session: Option<&Session>,
        contact: &ContactId,
        text: &str,
        now: Timestamp,
        known: Option<&ContactRecord>,
    ) -> Decision {
        // Reset wins over everything, in any state.
        if session.is_some() && self.keywords.is_reset(text) {
            return Decision::reply(SessionUpdate::Delete, self.messages.reset_done.clone());
        }

        // Any admitted message from a contact without a session opens one
        // at `Greeting`; whether it advances is decided below like any
        // other message.
        let mut session = match session {
            Some(s) => {
                let mut s = s.clone();
                s.touch(now);
                s
            }
            None => Session::new(contact.clone(), Step::Greeting, now),
        };

        match session.step {
            Step::Greeting => self.on_greeting(session, text, known),
            Step::ReturningMenu => self.on_returning_choice(session, text),
            Step::AwaitingName => self.on_name(session, text),
            Step::AwaitingDepartment => self.on_department(session, text),
            Step::AwaitingReason => self.on_reason(session, text),
            Step::AwaitingScheduling => self.on_scheduling(session, text, now),
            // Finished conversations stay quiet until reset or expiry.
            Step::Completed => Decision {
                update: SessionUpdate::Put(session),
                replies: Vec::new(),
                completed: None,
            },
        }
    }

    // ========================================================================
    // Per-step handlers
    // ========================================================================

    /// Only a greeting advances past `Greeting`; anything else is stored
    /// and dropped without a reply.
    fn on_greeting(
        &self,
        mut session: Session,
        text: &str,
        known: Option<&ContactRecord>,
    ) -> Decision {
        if !self.keywords.is_greeting(text) {
            return Decision {
                update: SessionUpdate::Put(session),
                replies: Vec::new(),
                completed: None,
            };
        }

        match known {
            Some(record) => {
                session.step = Step::ReturningMenu;
                session.client_name = record.display_name.clone();
                let reply = fill(
                    &self.messages.returning_menu,
                    &[("name", &record.display_name)],
                );
                Decision::reply(SessionUpdate::Put(session), reply)
            }
            None => {
                session.step = Step::AwaitingName;
                let reply = fill(&self.messages.opening, &[("office", &self.office_name)]);
                Decision::reply(SessionUpdate::Put(session), reply)
            }
        }
    }

    fn on_returning_choice(&self, mut session: Session, text: &str) -> Decision {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.as_str() {
            "1" => {
                // Continue the previous matter: route straight to the
                // general department, no further questions.
                let department = self.directory.general().clone();
                let reason = self.messages.returning_reason.clone();
                session.department_key = Some(department.key);
                session.reason = reason.clone();
                self.complete(session, &department, reason, None)
            }
            "2" => {
                session.step = Step::AwaitingDepartment;
                let reply = fill(
                    &self.messages.menu,
                    &[
                        ("name", session.client_name.as_str()),
                        ("menu", &self.directory.render_menu()),
                    ],
                );
                Decision::reply(SessionUpdate::Put(session), reply)
            }
            _ => Decision::reply(
                SessionUpdate::Put(session),
                self.messages.returning_invalid.clone(),
            ),
        }
    }

    fn on_name(&self, mut session: Session, text: &str) -> Decision {
        if text.chars().count() < self.min_name_len {
            return Decision::reply(
                SessionUpdate::Put(session),
                self.messages.name_too_short.clone(),
            );
        }

        // First name only; the menu and all later messages address the
        // contact by it.
        let first = text.split_whitespace().next().unwrap_or(text).to_string();
        session.client_name = first.clone();
        session.step = Step::AwaitingDepartment;

        let reply = fill(
            &self.messages.menu,
            &[("name", &first), ("menu", &self.directory.render_menu())],
        );
        Decision::reply(SessionUpdate::Put(session), reply)
    }

    fn on_department(&self, mut session: Session, text: &str) -> Decision {
        match self.directory.parse_selection(text) {
            Some(department) => {
                session.department_key = Some(department.key);
                session.step = Step::AwaitingReason;
                Decision::reply(SessionUpdate::Put(session), self.messages.ask_reason.clone())
            }
            None => Decision::reply(
                SessionUpdate::Put(session),
                self.messages.invalid_department.clone(),
            ),
        }
    }

    fn on_reason(&self, mut session: Session, text: &str) -> Decision {
        session.reason = text.to_string();
        session.step = Step::AwaitingScheduling;
        Decision::reply(
            SessionUpdate::Put(session),
            self.messages.ask_scheduling.clone(),
        )
    }

    fn on_scheduling(&self, session: Session, text: &str, now: Timestamp) -> Decision {
        // Anything that is not clearly a yes counts as a no; the contact
        // already gave everything the office needs.
        let scheduled = self.keywords.is_affirmative(text);

        let department = session
            .department_key
            .and_then(|key| self.directory.lookup(key))
            .unwrap_or_else(|| self.directory.general())
            .clone();
        let reason = session.reason.clone();
        let mut decision = self.complete(session, &department, reason, Some(scheduled));

        if let Some(suffix) = self.after_hours_suffix(now) {
            if let Some(last) = decision.replies.last_mut() {
                last.push_str(&suffix);
            }
        }
        decision
    }

    // ========================================================================
    // Completion
    // ========================================================================

    fn complete(
        &self,
        mut session: Session,
        department: &Department,
        reason: String,
        scheduled: Option<bool>,
    ) -> Decision {
        let record = IntakeRecord::new(
            session.contact.digits(),
            session.client_name.clone(),
            reason,
            department,
            session.last_activity,
            scheduled,
        );

        let reply = if scheduled == Some(true) {
            fill(
                &self.messages.closing_scheduled,
                &[
                    ("name", &session.client_name),
                    ("link", &self.scheduling_link),
                    ("department", &department.label),
                ],
            )
        } else {
            fill(
                &self.messages.closing_transfer,
                &[
                    ("name", &session.client_name),
                    ("department", &department.label),
                ],
            )
        };

        session.step = Step::Completed;
        Decision {
            update: SessionUpdate::Put(session),
            replies: vec![reply],
            completed: Some(record),
        }
    }

    /// Out-of-hours notice appended to closing messages, when enabled.
    fn after_hours_suffix(&self, now: Timestamp) -> Option<String> {
        if !self.hours.enabled {
            return None;
        }
        let hour = local_hour(now)?;
        if hour >= self.hours.start_hour && hour < self.hours.end_hour {
            return None;
        }
        Some(fill(
            &self.messages.after_hours_suffix,
            &[
                ("start", &self.hours.start_hour.to_string()),
                ("end", &self.hours.end_hour.to_string()),
            ],
        ))
    }
}

fn local_hour(now: Timestamp) -> Option<u32> {
    chrono::Local
        .timestamp_opt(now.0, 0)
        .single()
        .map(|dt| dt.hour())
}

/// Replaces `{key}` placeholders in a message template.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}
