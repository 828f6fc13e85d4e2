use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::value_objects::Alert;

/// Port for the external notification channel
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send_alert(&self, alert: &Alert) -> Result<()>;
}
