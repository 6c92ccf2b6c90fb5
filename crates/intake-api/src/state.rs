//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use intake_core::transport::Transport;
use intake_flow::SessionStore;

/// Shared application state, cheaply cloned into each handler task.
#[derive(Clone)]
pub struct AppState {
    /// The messaging channel, for connectivity and the login challenge.
    pub transport: Arc<dyn Transport>,
    /// Live conversation sessions.
    pub sessions: Arc<SessionStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(transport: Arc<dyn Transport>, sessions: Arc<SessionStore>) -> Self {
        Self {
            transport,
            sessions,
            start_time: Instant::now(),
        }
    }
}
