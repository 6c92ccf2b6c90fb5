//! Reply pacing.
//!
//! Outbound replies are delayed in proportion to their length so the
//! conversation reads like a person typing rather than an instant
//! autoresponder. The strategy is a port so tests and the console
//! transport can opt out.

use async_trait::async_trait;
use std::time::Duration;

use intake_core::config::ReplyConfig;

/// Strategy for delaying a reply before it is sent.
#[async_trait]
pub trait ReplyPacer: Send + Sync {
    async fn pace(&self, text: &str);
}

/// Length-proportional typing delay, clamped to configured bounds.
pub struct TypingPacer {
    config: ReplyConfig,
}

impl TypingPacer {
    pub fn new(config: ReplyConfig) -> Self {
        Self { config }
    }

    fn delay_for(&self, text: &str) -> Duration {
        let chars = text.chars().count() as u64;
        let ms = (self.config.min_delay_ms + chars * self.config.per_char_ms)
            .min(self.config.max_delay_ms);
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl ReplyPacer for TypingPacer {
    async fn pace(&self, text: &str) {
        tokio::time::sleep(self.delay_for(text)).await;
    }
}

/// No delay at all.
pub struct NoopPacer;

#[async_trait]
impl ReplyPacer for NoopPacer {
    async fn pace(&self, _text: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacer() -> TypingPacer {
        TypingPacer::new(ReplyConfig {
            min_delay_ms: 600,
            max_delay_ms: 2500,
            per_char_ms: 30,
        })
    }

    #[test]
    fn test_delay_scales_with_length() {
        let p = pacer();
        assert_eq!(p.delay_for(""), Duration::from_millis(600));
        assert_eq!(p.delay_for("oi"), Duration::from_millis(660));
        assert_eq!(p.delay_for(&"x".repeat(10)), Duration::from_millis(900));
    }

    #[test]
    fn test_delay_is_clamped_to_max() {
        let p = pacer();
        assert_eq!(p.delay_for(&"x".repeat(500)), Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_noop_pacer_returns_immediately() {
        let start = std::time::Instant::now();
        NoopPacer.pace("a long message that would otherwise wait").await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
