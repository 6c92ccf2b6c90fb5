//! Outbound webhook for completed intakes.
//!
//! Posts a JSON document to the office's configured endpoint (CRM,
//! spreadsheet automation, whatever they wired up). The payload keys are
//! part of the office-facing contract; do not rename them.

use async_trait::async_trait;
use std::time::Duration;

use intake_core::config::WebhookConfig;
use intake_core::error::{IntakeError, Result};
use intake_core::types::IntakeRecord;

/// Destination for completed-intake payloads.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn post(&self, record: &IntakeRecord) -> Result<()>;
}

/// The JSON body posted for one completed intake.
pub fn payload(record: &IntakeRecord) -> serde_json::Value {
    let mut body = serde_json::json!({
        "telefone": record.phone,
        "nome": record.name,
        "info": record.reason,
        "setor": record.department_label,
        "timestamp": record.timestamp.to_rfc3339(),
    });
    if let Some(scheduled) = record.scheduled {
        body["agendado"] = serde_json::Value::Bool(scheduled);
    }
    body
}

/// reqwest-backed webhook with a hard request timeout.
pub struct HttpWebhook {
    client: reqwest::Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(IntakeError::Config(
                "webhook enabled but no url configured".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IntakeError::Notify(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl WebhookSink for HttpWebhook {
    async fn post(&self, record: &IntakeRecord) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload(record))
            .send()
            .await
            .map_err(|e| IntakeError::Notify(format!("Webhook request failed: {}", e)))?;

        response
            .error_for_status()
            .map_err(|e| IntakeError::Notify(format!("Webhook rejected payload: {}", e)))?;
        Ok(())
    }
}
