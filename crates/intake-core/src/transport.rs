//! The messaging-channel port.
//!
//! Everything channel-specific lives behind [`Transport`]; the flow engine
//! and the status surface only ever see these types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::types::ContactId;

/// Connectivity of the underlying messaging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    /// Waiting for a login challenge (QR code) to be scanned.
    QrPending,
    Ready,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::QrPending => "qr_pending",
            ConnectionState::Ready => "ready",
            ConnectionState::Disconnected => "disconnected",
        };
        write!(f, "{}", s)
    }
}

/// Kind of an inbound event as classified by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Chat,
    Sticker,
    CallLog,
    Revoked,
    Notice,
    Other,
}

impl EventKind {
    /// Only plain chat messages enter the intake flow.
    pub fn is_chat(self) -> bool {
        matches!(self, EventKind::Chat)
    }
}

/// An inbound message event from the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub from: ContactId,
    pub body: String,
    /// Channel-reported send time, seconds since the Unix epoch.
    pub timestamp_secs: i64,
    pub kind: EventKind,
    /// True for messages sent by our own account.
    pub from_me: bool,
}

/// Abstraction over the messaging channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers outbound text to a contact or staff inbox.
    async fn send_text(&self, to: &ContactId, text: &str) -> Result<()>;

    /// Current connectivity of the messaging session.
    fn connection_state(&self) -> ConnectionState;

    /// Opaque login challenge payload while in `QrPending`, if any.
    fn login_challenge(&self) -> Option<String>;
}
