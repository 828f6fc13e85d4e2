mod alert_sink;
mod encoder;
mod metrics_reporter;

pub use alert_sink::AlertSink;
pub use encoder::{Diagnostics, Encoder, RelayProcess};
pub use metrics_reporter::MetricsReporter;
