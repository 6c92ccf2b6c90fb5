//! The flow engine: inbound events in, paced replies and completions out.
//!
//! The engine owns the boundary between the raw transport and the pure
//! state machine. It drops events that must never reach the flow, runs the
//! machine against the session store under a single lock acquisition, then
//! performs the side effects (paced replies, completion delivery) outside
//! the lock. Every failure is logged and swallowed so one bad event never
//! takes down the intake loop.

use std::sync::Arc;

use tracing::{debug, warn};

use intake_core::error::Result;
use intake_core::sink::CompletionSink;
use intake_core::store::ContactStore;
use intake_core::transport::{InboundEvent, Transport};
use intake_core::types::Timestamp;

use crate::machine::{Decision, IntakeMachine};
use crate::pacer::ReplyPacer;
use crate::session::SessionStore;

pub struct FlowEngine {
    machine: IntakeMachine,
    sessions: Arc<SessionStore>,
    contacts: Arc<dyn ContactStore>,
    transport: Arc<dyn Transport>,
    pacer: Arc<dyn ReplyPacer>,
    sink: Arc<dyn CompletionSink>,
    /// Events time-stamped before this are history replayed by the channel
    /// on reconnect, not new conversation.
    started_at: Timestamp,
}

impl FlowEngine {
    pub fn new(
        machine: IntakeMachine,
        sessions: Arc<SessionStore>,
        contacts: Arc<dyn ContactStore>,
        transport: Arc<dyn Transport>,
        pacer: Arc<dyn ReplyPacer>,
        sink: Arc<dyn CompletionSink>,
    ) -> Self {
        Self {
            machine,
            sessions,
            contacts,
            transport,
            pacer,
            sink,
            started_at: Timestamp::now(),
        }
    }

    /// Processes one inbound event, logging and swallowing any error.
    pub async fn process_event(&self, event: InboundEvent) {
        let from = event.from.clone();
        if let Err(e) = self.handle(event).await {
            warn!(contact = %from, error = %e, "Failed to process inbound event");
        }
    }

    async fn handle(&self, event: InboundEvent) -> Result<()> {
        if !self.admit(&event) {
            return Ok(());
        }

        let body = event.body.trim();
        let now = Timestamp::now();

        // Contact lookup is best-effort: a storage hiccup downgrades the
        // sender to "unknown" instead of dropping the message.
        let known = match self.contacts.lookup(&event.from.digits()) {
            Ok(record) => record,
            Err(e) => {
                warn!(contact = %event.from, error = %e, "Contact lookup failed");
                None
            }
        };

        // Read-decide-write under one lock; no awaits inside.
        let decision: Decision = self.sessions.resolve(&event.from, |current| {
            let decision = self
                .machine
                .advance(current, &event.from, body, now, known.as_ref());
            (decision.update.clone(), decision)
        })?;

        for reply in &decision.replies {
            self.pacer.pace(reply).await;
            if let Err(e) = self.transport.send_text(&event.from, reply).await {
                warn!(contact = %event.from, error = %e, "Failed to send reply");
            }
        }

        if let Some(record) = decision.completed {
            self.sink.deliver(&record).await;
        }

        Ok(())
    }

    /// Boundary filters: only fresh, individual, inbound chat text enters
    /// the flow.
    fn admit(&self, event: &InboundEvent) -> bool {
        if event.from_me {
            return false;
        }
        if !event.kind.is_chat() {
            debug!(contact = %event.from, kind = ?event.kind, "Ignoring non-chat event");
            return false;
        }
        if event.from.is_group() || event.from.is_broadcast() {
            return false;
        }
        if event.timestamp_secs < self.started_at.0 {
            debug!(contact = %event.from, "Ignoring replayed event from before startup");
            return false;
        }
        if event.body.trim().is_empty() {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use intake_core::config::IntakeConfig;
    use intake_core::error::IntakeError;
    use intake_core::transport::{ConnectionState, EventKind};
    use intake_core::types::{ContactId, ContactRecord, IntakeRecord};

    use crate::pacer::NoopPacer;
    use crate::session::Step;

    struct MockTransport {
        sent: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send_text(&self, to: &ContactId, text: &str) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(IntakeError::Transport("send failed".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.as_raw().to_string(), text.to_string()));
            Ok(())
        }

        fn connection_state(&self) -> ConnectionState {
            ConnectionState::Ready
        }

        fn login_challenge(&self) -> Option<String> {
            None
        }
    }

    struct MemoryContacts {
        records: Mutex<HashMap<String, ContactRecord>>,
    }

    impl MemoryContacts {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
            }
        }
    }

    impl ContactStore for MemoryContacts {
        fn lookup(&self, phone: &str) -> Result<Option<ContactRecord>> {
            Ok(self.records.lock().unwrap().get(phone).cloned())
        }

        fn upsert(&self, phone: &str, display_name: &str, at: Timestamp) -> Result<()> {
            self.records.lock().unwrap().insert(
                phone.to_string(),
                ContactRecord {
                    display_name: display_name.to_string(),
                    last_contact_at: at,
                },
            );
            Ok(())
        }
    }

    struct RecordingSink {
        records: Mutex<Vec<IntakeRecord>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionSink for RecordingSink {
        async fn deliver(&self, record: &IntakeRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    struct Harness {
        engine: FlowEngine,
        sessions: Arc<SessionStore>,
        transport: Arc<MockTransport>,
        sink: Arc<RecordingSink>,
    }

    fn harness() -> Harness {
        let mut config = IntakeConfig::default();
        config.hours.enabled = false;
        let machine = IntakeMachine::new(&config).unwrap();

        let sessions = Arc::new(SessionStore::new());
        let transport = Arc::new(MockTransport::new());
        let sink = Arc::new(RecordingSink::new());
        let engine = FlowEngine::new(
            machine,
            Arc::clone(&sessions),
            Arc::new(MemoryContacts::new()),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(NoopPacer),
            Arc::clone(&sink) as Arc<dyn CompletionSink>,
        );

        Harness {
            engine,
            sessions,
            transport,
            sink,
        }
    }

    fn chat(from: &str, body: &str) -> InboundEvent {
        InboundEvent {
            from: ContactId::new(from),
            body: body.to_string(),
            timestamp_secs: Timestamp::now().0 + 1,
            kind: EventKind::Chat,
            from_me: false,
        }
    }

    const PHONE: &str = "5511987654321@c.us";

    #[tokio::test]
    async fn test_full_intake_over_the_engine() {
        let h = harness();

        for body in ["oi", "Maria Silva", "1", "dúvida sobre aposentadoria", "sim"] {
            h.engine.process_event(chat(PHONE, body)).await;
        }

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|(to, _)| to == PHONE));
        assert!(sent[0].1.contains("nome e sobrenome"));
        assert!(sent[4].1.contains("Agende seu horário"));

        let records = h.sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Maria");
        assert_eq!(records[0].department_label, "Direito Trabalhista");
        assert_eq!(records[0].scheduled, Some(true));

        let session = h.sessions.get(&ContactId::new(PHONE)).unwrap().unwrap();
        assert_eq!(session.step, Step::Completed);
    }

    #[tokio::test]
    async fn test_boundary_filters_drop_events_silently() {
        let h = harness();

        let mut stale = chat(PHONE, "oi");
        stale.timestamp_secs = h.engine.started_at.0 - 100;

        let mut own = chat(PHONE, "oi");
        own.from_me = true;

        let mut sticker = chat(PHONE, "oi");
        sticker.kind = EventKind::Sticker;

        let events = vec![
            stale,
            own,
            sticker,
            chat("123456789@g.us", "oi"),
            chat("status@broadcast", "oi"),
            chat(PHONE, "   "),
        ];
        for event in events {
            h.engine.process_event(event).await;
        }

        assert!(h.transport.sent().is_empty());
        assert!(h.sessions.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_non_greeting_from_stranger_gets_no_reply() {
        let h = harness();
        h.engine.process_event(chat(PHONE, "quanto custa?")).await;
        assert!(h.transport.sent().is_empty());

        // A silent session is parked at Greeting, waiting for a greeting.
        let session = h.sessions.get(&ContactId::new(PHONE)).unwrap().unwrap();
        assert_eq!(session.step, Step::Greeting);
    }

    #[tokio::test]
    async fn test_reset_mid_flow_drops_session() {
        let h = harness();
        h.engine.process_event(chat(PHONE, "oi")).await;
        h.engine.process_event(chat(PHONE, "Maria Silva")).await;
        h.engine.process_event(chat(PHONE, "cancelar")).await;

        assert!(h.sessions.is_empty().unwrap());
        let sent = h.transport.sent();
        assert!(sent.last().unwrap().1.contains("reiniciado"));
        assert!(h.sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stall_the_flow() {
        let h = harness();
        h.transport.fail.store(true, Ordering::SeqCst);

        h.engine.process_event(chat(PHONE, "oi")).await;

        // The reply was lost but the session advanced; the next message
        // continues the flow.
        let session = h.sessions.get(&ContactId::new(PHONE)).unwrap().unwrap();
        assert_eq!(session.step, Step::AwaitingName);

        h.transport.fail.store(false, Ordering::SeqCst);
        h.engine.process_event(chat(PHONE, "Maria Silva")).await;
        let session = h.sessions.get(&ContactId::new(PHONE)).unwrap().unwrap();
        assert_eq!(session.step, Step::AwaitingDepartment);
    }

    #[tokio::test]
    async fn test_two_contacts_have_independent_sessions() {
        let h = harness();
        let other = "5521900000000@c.us";

        h.engine.process_event(chat(PHONE, "oi")).await;
        h.engine.process_event(chat(other, "boa tarde")).await;
        h.engine.process_event(chat(PHONE, "Maria Silva")).await;

        assert_eq!(h.sessions.len().unwrap(), 2);
        let a = h.sessions.get(&ContactId::new(PHONE)).unwrap().unwrap();
        let b = h.sessions.get(&ContactId::new(other)).unwrap().unwrap();
        assert_eq!(a.step, Step::AwaitingDepartment);
        assert_eq!(b.step, Step::AwaitingName);
    }
}
