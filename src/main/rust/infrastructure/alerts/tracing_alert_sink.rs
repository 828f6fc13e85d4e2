use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::ports::AlertSink;
use crate::domain::value_objects::{Alert, AlertLevel};

/// Alert sink that writes alerts to the log under the `alert` target
#[derive(Debug, Default, Clone)]
pub struct TracingAlertSink;

impl TracingAlertSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn send_alert(&self, alert: &Alert) -> Result<()> {
        match alert.level {
            AlertLevel::Error => {
                tracing::error!(target: "alert", title = %alert.title, "{}", alert.message)
            }
            AlertLevel::Warning => {
                tracing::warn!(target: "alert", title = %alert.title, "{}", alert.message)
            }
            AlertLevel::Info => {
                tracing::info!(target: "alert", title = %alert.title, "{}", alert.message)
            }
        }
        Ok(())
    }
}
