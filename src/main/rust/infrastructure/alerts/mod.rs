mod tracing_alert_sink;

pub use tracing_alert_sink::TracingAlertSink;
