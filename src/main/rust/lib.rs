pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{
    AdaptiveMonitor, HealthMonitor, HealthReport, ShutdownOutcome, Stream, StreamManager,
};
pub use config::{AgentFile, Config};
pub use domain::entities::{AdaptiveController, QualityStep, StreamLifecycle, StreamStatus};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{AlertSink, Encoder, MetricsReporter, RelayProcess};
pub use domain::value_objects::{
    AdaptiveSettings, Alert, AlertLevel, BitrateProfile, Camera, EncodingSettings, Ladder,
    RelayJob, RelaySettings, SrtDestination, StreamState,
};
pub use infrastructure::alerts::TracingAlertSink;
pub use infrastructure::ffmpeg::{ArgumentBuilder, FfmpegEncoder};
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
