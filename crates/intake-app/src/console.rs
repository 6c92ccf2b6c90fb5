//! Console transport: a stdin/stdout stand-in for the real messaging
//! channel so the full pipeline can be exercised locally.
//!
//! Inbound lines have the form `<phone> <message>`; replies are printed
//! to stdout prefixed with the destination.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use intake_core::error::Result;
use intake_core::transport::{ConnectionState, EventKind, InboundEvent, Transport};
use intake_core::types::{ContactId, Timestamp};

pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(&self, to: &ContactId, text: &str) -> Result<()> {
        println!("-> [{}]\n{}\n", to, text);
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Ready
    }

    fn login_challenge(&self) -> Option<String> {
        None
    }
}

/// Parses one console line into an inbound event.
fn parse_line(line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (phone, body) = line.split_once(' ')?;
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    Some(InboundEvent {
        from: ContactId::new(format!("{}@c.us", phone)),
        body: body.to_string(),
        timestamp_secs: Timestamp::now().0,
        kind: EventKind::Chat,
        from_me: false,
    })
}

/// Reads stdin lines and feeds them to the engine until EOF.
pub async fn read_events(tx: mpsc::Sender<InboundEvent>) {
    info!("Console transport ready; type `<phone> <message>` to chat");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_line(&line) {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                None => {
                    if !line.trim().is_empty() {
                        println!("(use: <phone> <message>, e.g. `5511987654321 oi`)");
                    }
                }
            },
            Ok(None) => {
                info!("Console input closed");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let event = parse_line("5511987654321 oi, tudo bem?").unwrap();
        assert_eq!(event.from.as_raw(), "5511987654321@c.us");
        assert_eq!(event.body, "oi, tudo bem?");
        assert_eq!(event.kind, EventKind::Chat);
        assert!(!event.from_me);
    }

    #[test]
    fn test_parse_line_rejects_malformed_input() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("oi").is_none());
        assert!(parse_line("notaphone oi").is_none());
        assert!(parse_line("551 ").is_none());
    }
}
