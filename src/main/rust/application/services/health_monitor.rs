use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::StreamManager;
use crate::domain::entities::StreamStatus;
use crate::domain::ports::{AlertSink, MetricsReporter};
use crate::domain::value_objects::{Alert, Camera, StreamState};

/// Alert once a stream has logged more errors than this
pub const ERROR_ALERT_THRESHOLD: u64 = 10;

/// Minimum spacing between two alerts of the same kind for one camera
pub const ALERT_THROTTLE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Concern {
    ErrorRate,
    LowBitrate,
}

/// What one health pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub restarted: Vec<String>,
    pub alerts_sent: usize,
}

/// Periodic maintenance over the manager: publishes metrics, raises
/// throttled alerts and restarts streams that failed or never came up.
pub struct HealthMonitor {
    manager: Arc<StreamManager>,
    alerts: Arc<dyn AlertSink>,
    metrics: Arc<dyn MetricsReporter>,
    cameras: Vec<Camera>,
    interval: Duration,
    throttle: Duration,
    last_alert: HashMap<(String, Concern), Instant>,
}

impl HealthMonitor {
    pub fn new(
        manager: Arc<StreamManager>,
        alerts: Arc<dyn AlertSink>,
        metrics: Arc<dyn MetricsReporter>,
        cameras: Vec<Camera>,
        interval: Duration,
    ) -> Self {
        Self {
            manager,
            alerts,
            metrics,
            cameras,
            interval,
            throttle: ALERT_THROTTLE,
            last_alert: HashMap::new(),
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval = ?self.interval, cameras = self.cameras.len(), "Health monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.check().await;
                    if !report.restarted.is_empty() {
                        tracing::info!(restarted = ?report.restarted, "Health check restarted streams");
                    }
                }
            }
        }

        tracing::info!("Health monitor stopped");
    }

    /// One maintenance pass
    pub async fn check(&mut self) -> HealthReport {
        let mut report = HealthReport::default();
        let statuses = self.manager.report_metrics().await;

        for status in &statuses {
            if status.error_count > ERROR_ALERT_THRESHOLD {
                let alert = Alert::warning(
                    "High Error Rate",
                    format!(
                        "Stream {} has {} errors (last: {})",
                        status.camera_id,
                        status.error_count,
                        status.last_error.as_deref().unwrap_or("none")
                    ),
                );
                if self.raise(&status.camera_id, Concern::ErrorRate, alert).await {
                    report.alerts_sent += 1;
                }
            }

            if status.state == StreamState::Running && status.is_starved() {
                if self.raise(&status.camera_id, Concern::LowBitrate, low_bitrate(status)).await {
                    report.alerts_sent += 1;
                }
            }
        }

        let tracked: HashSet<&str> = statuses.iter().map(|s| s.camera_id.as_str()).collect();
        let mut pending = self.manager.failed_cameras().await;
        pending.extend(
            self.cameras
                .iter()
                .filter(|camera| !tracked.contains(camera.id.as_str()))
                .cloned(),
        );

        for camera in pending {
            let camera_id = camera.id.clone();
            self.metrics.report_restart_attempt(&camera_id);
            tracing::info!(camera_id = %camera_id, "Restarting stream");

            match self.manager.start_stream(camera).await {
                Ok(()) => report.restarted.push(camera_id),
                Err(e) => {
                    tracing::warn!(camera_id = %camera_id, error = %e, "Stream restart failed");
                }
            }
        }

        report
    }

    async fn raise(&mut self, camera_id: &str, concern: Concern, alert: Alert) -> bool {
        let now = Instant::now();
        let key = (camera_id.to_string(), concern);
        if let Some(previous) = self.last_alert.get(&key) {
            if now.duration_since(*previous) < self.throttle {
                return false;
            }
        }

        match self.alerts.send_alert(&alert).await {
            Ok(()) => {
                self.last_alert.insert(key, now);
                true
            }
            Err(e) => {
                tracing::warn!(camera_id = %camera_id, error = %e, "Failed to send alert");
                false
            }
        }
    }
}

fn low_bitrate(status: &StreamStatus) -> Alert {
    Alert::warning(
        "Low Bitrate",
        format!(
            "Stream {} bitrate is {} bps (target: {} bps)",
            status.camera_id, status.current_bitrate, status.target_bitrate
        ),
    )
}
