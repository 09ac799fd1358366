// Tracing log adapter - Structured logging using tracing crate

use crate::ports::*;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Tracing log adapter
pub struct TracingLogAdapter {
    current_level: LogLevel,
}

impl TracingLogAdapter {
    /// Create new tracing log adapter; the subscriber is installed by the binary
    pub fn new(level: LogLevel) -> Self {
        Self {
            current_level: level,
        }
    }

    /// Check if log level should be logged
    fn should_log(&self, level: &LogLevel) -> bool {
        level >= &self.current_level
    }

    fn render_context(event: &LogEvent) -> String {
        let mut pairs: Vec<String> = event
            .context
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        pairs.sort();
        pairs.join(" ")
    }
}

impl Default for TracingLogAdapter {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[async_trait]
impl LogPort for TracingLogAdapter {
    async fn info(&self, message: &str) {
        if self.should_log(&LogLevel::Info) {
            info!("{}", message);
        }
    }

    async fn warn(&self, message: &str) {
        if self.should_log(&LogLevel::Warn) {
            warn!("{}", message);
        }
    }

    async fn error(&self, message: &str) {
        if self.should_log(&LogLevel::Error) {
            error!("{}", message);
        }
    }

    async fn debug(&self, message: &str) {
        if self.should_log(&LogLevel::Debug) {
            debug!("{}", message);
        }
    }

    async fn log_event(&self, event: &LogEvent) {
        if !self.should_log(&event.level) {
            return;
        }

        let context = Self::render_context(event);
        match event.level {
            LogLevel::Error => tracing::error!(message = %event.message, %context),
            LogLevel::Warn => tracing::warn!(message = %event.message, %context),
            LogLevel::Info => tracing::info!(message = %event.message, %context),
            LogLevel::Debug => tracing::debug!(message = %event.message, %context),
            LogLevel::Trace => tracing::trace!(message = %event.message, %context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filtering() {
        let adapter = TracingLogAdapter::new(LogLevel::Warn);
        assert!(adapter.should_log(&LogLevel::Error));
        assert!(adapter.should_log(&LogLevel::Warn));
        assert!(!adapter.should_log(&LogLevel::Info));
    }

    #[test]
    fn test_context_is_rendered_sorted() {
        let event = LogEvent::new(LogLevel::Info, "synced")
            .with("video_result_id", 42)
            .with("created", 3);
        assert_eq!(
            TracingLogAdapter::render_context(&event),
            "created=3 video_result_id=42"
        );
    }
}
