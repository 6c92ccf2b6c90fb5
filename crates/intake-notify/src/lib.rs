//! Completion effects: staff alerts, contact persistence, and the
//! outbound webhook.

pub mod alert;
pub mod dispatcher;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use webhook::{HttpWebhook, WebhookSink};
