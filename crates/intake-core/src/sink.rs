//! The completion port: where finished intakes go.

use async_trait::async_trait;

use crate::types::IntakeRecord;

/// Receives completed intakes for alerting and persistence.
///
/// Delivery is best-effort: implementations log failures instead of
/// propagating them so a downstream outage never stalls the conversation.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn deliver(&self, record: &IntakeRecord);
}
