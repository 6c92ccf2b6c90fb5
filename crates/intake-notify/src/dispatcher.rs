//! Completion dispatcher.
//!
//! Fans one completed intake out to three independent effects: the staff
//! alert, the contact upsert, and the webhook. Each effect is best-effort;
//! one failing never blocks the others, and none of them ever surfaces an
//! error to the conversation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use intake_core::sink::CompletionSink;
use intake_core::store::ContactStore;
use intake_core::transport::Transport;
use intake_core::types::{ContactId, IntakeRecord};

use crate::alert;
use crate::webhook::WebhookSink;

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    contacts: Arc<dyn ContactStore>,
    webhook: Option<Arc<dyn WebhookSink>>,
    /// Staff inbox used when a department carries no recipient of its own.
    fallback_recipient: String,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        contacts: Arc<dyn ContactStore>,
        webhook: Option<Arc<dyn WebhookSink>>,
        fallback_recipient: String,
    ) -> Self {
        Self {
            transport,
            contacts,
            webhook,
            fallback_recipient,
        }
    }

    fn alert_recipient(&self, record: &IntakeRecord) -> ContactId {
        if record.department_recipient.is_empty() {
            ContactId::new(self.fallback_recipient.clone())
        } else {
            ContactId::new(record.department_recipient.clone())
        }
    }
}

#[async_trait]
impl CompletionSink for Dispatcher {
    async fn deliver(&self, record: &IntakeRecord) {
        let recipient = self.alert_recipient(record);
        match self
            .transport
            .send_text(&recipient, &alert::format_alert(record))
            .await
        {
            Ok(()) => info!(
                intake = %record.id,
                department = %record.department_label,
                "Lead alert delivered"
            ),
            Err(e) => warn!(intake = %record.id, error = %e, "Failed to deliver lead alert"),
        }

        if let Err(e) = self
            .contacts
            .upsert(&record.phone, &record.name, record.timestamp)
        {
            warn!(intake = %record.id, error = %e, "Failed to persist contact");
        }

        if let Some(webhook) = &self.webhook {
            if let Err(e) = webhook.post(record).await {
                warn!(intake = %record.id, error = %e, "Webhook delivery failed");
            }
        }
    }
}
