//! Idle-session sweeper.
//!
//! A background loop that warns quiet contacts once per idle period and
//! expires sessions that stay quiet past the timeout. Sends are
//! best-effort; an unreachable contact still gets swept.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

use intake_core::config::IntakeConfig;
use intake_core::transport::Transport;
use intake_core::types::Timestamp;

use crate::session::SessionStore;

pub struct IdleSweeper {
    sessions: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    warn_after_secs: i64,
    ttl_secs: i64,
    interval: Duration,
    idle_warning: String,
    idle_closed: String,
    shutdown: Arc<Notify>,
}

impl IdleSweeper {
    pub fn new(
        sessions: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
        config: &IntakeConfig,
    ) -> Self {
        Self {
            sessions,
            transport,
            warn_after_secs: (config.session.warn_after_minutes * 60) as i64,
            ttl_secs: (config.session.idle_timeout_minutes * 60) as i64,
            interval: Duration::from_secs(config.session.sweep_interval_secs),
            idle_warning: config.messages.idle_warning.clone(),
            idle_closed: config.messages.idle_closed.clone(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Runs the sweep loop until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once(Timestamp::now()).await;
                }
                _ = self.shutdown.notified() => return,
            }
        }
    }

    /// One pass: warn first, then expire.
    pub async fn sweep_once(&self, now: Timestamp) {
        match self.sessions.warn_candidates(now, self.warn_after_secs) {
            Ok(candidates) => {
                for session in candidates {
                    if let Err(e) = self
                        .transport
                        .send_text(&session.contact, &self.idle_warning)
                        .await
                    {
                        warn!(contact = %session.contact, error = %e, "Failed to send idle warning");
                    }
                }
            }
            Err(e) => warn!(error = %e, "Idle warning scan failed"),
        }

        match self.sessions.sweep_expired(now, self.ttl_secs) {
            Ok(expired) => {
                for session in &expired {
                    // Finished intakes and never-greeted contacts expire
                    // without a goodbye.
                    if !session.step.is_engaged() {
                        continue;
                    }
                    if let Err(e) = self
                        .transport
                        .send_text(&session.contact, &self.idle_closed)
                        .await
                    {
                        warn!(contact = %session.contact, error = %e, "Failed to send idle closure");
                    }
                }
                if !expired.is_empty() {
                    info!(count = expired.len(), "Expired idle sessions");
                }
            }
            Err(e) => warn!(error = %e, "Idle expiry scan failed"),
        }
    }

    /// Signal the sweeper to shut down gracefully.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use intake_core::error::Result;
    use intake_core::transport::ConnectionState;
    use intake_core::types::ContactId;

    use crate::session::{Session, Step};

    struct MockTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send_text(&self, to: &ContactId, text: &str) -> Result<()> {
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

    fn sweeper_with(sessions: Arc<SessionStore>) -> (IdleSweeper, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let config = IntakeConfig::default();
        let sweeper = IdleSweeper::new(
            sessions,
            Arc::clone(&transport) as Arc<dyn Transport>,
            &config,
        );
        (sweeper, transport)
    }

    fn session_at(id: &str, step: Step, at: i64) -> Session {
        Session::new(ContactId::new(id), step, Timestamp(at))
    }

    #[tokio::test]
    async fn test_sweeper_shutdown() {
        let (sweeper, _) = sweeper_with(Arc::new(SessionStore::new()));

        // Shutdown immediately; run() should return quickly.
        sweeper.shutdown();
        tokio::time::timeout(Duration::from_secs(2), sweeper.run())
            .await
            .expect("Sweeper should shut down within timeout");
    }

    #[tokio::test]
    async fn test_warns_once_then_expires() {
        let sessions = Arc::new(SessionStore::new());
        sessions
            .put(session_at("551@c.us", Step::AwaitingName, 0))
            .unwrap();
        let (sweeper, transport) = sweeper_with(Arc::clone(&sessions));

        // Past the 15-minute warning threshold: one warning.
        sweeper.sweep_once(Timestamp(16 * 60)).await;
        assert_eq!(transport.sent().len(), 1);
        assert!(transport.sent()[0].1.contains("ainda está aí"));

        // A second pass in the same idle period stays quiet.
        sweeper.sweep_once(Timestamp(17 * 60)).await;
        assert_eq!(transport.sent().len(), 1);

        // Past the 30-minute timeout: closure message, session gone.
        sweeper.sweep_once(Timestamp(31 * 60)).await;
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].1.contains("inatividade"));
        assert!(sessions.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_completed_sessions_expire_silently() {
        let sessions = Arc::new(SessionStore::new());
        sessions
            .put(session_at("551@c.us", Step::Completed, 0))
            .unwrap();
        let (sweeper, transport) = sweeper_with(Arc::clone(&sessions));

        sweeper.sweep_once(Timestamp(31 * 60)).await;
        assert!(transport.sent().is_empty());
        assert!(sessions.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_fresh_sessions_are_left_alone() {
        let sessions = Arc::new(SessionStore::new());
        sessions
            .put(session_at("551@c.us", Step::AwaitingReason, 10 * 60))
            .unwrap();
        let (sweeper, transport) = sweeper_with(Arc::clone(&sessions));

        sweeper.sweep_once(Timestamp(12 * 60)).await;
        assert!(transport.sent().is_empty());
        assert_eq!(sessions.len().unwrap(), 1);
    }
}
