mod adaptive_monitor;
mod health_monitor;
mod stream;
mod stream_manager;

pub use adaptive_monitor::AdaptiveMonitor;
pub use health_monitor::{HealthMonitor, HealthReport, ALERT_THROTTLE, ERROR_ALERT_THRESHOLD};
pub use stream::Stream;
pub use stream_manager::{ShutdownOutcome, StreamManager, DEFAULT_STOP_TIMEOUT};
