use prometheus::{Encoder, GaugeVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::domain::entities::StreamStatus;
use crate::domain::ports::MetricsReporter;

const CAMERA_LABEL: &[&str] = &["camera_id"];

/// Prometheus-backed metrics sink.
///
/// Owns its registry so several instances (one per test, one per process)
/// never collide on registration.
pub struct PrometheusReporter {
    registry: Registry,
    // Stream state (0=Stopped, 1=Starting, 2=Running, 3=Stopping, 4=Failed)
    stream_state: GaugeVec,
    current_bitrate: IntGaugeVec,
    target_bitrate: IntGaugeVec,
    current_fps: IntGaugeVec,
    error_count: IntGaugeVec,
    bytes_sent: IntGaugeVec,
    packets_lost: IntGaugeVec,
    restart_attempts: IntCounterVec,
    active_streams: IntGauge,
}

impl PrometheusReporter {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("edge_relay".to_string()), None)?;

        let stream_state = GaugeVec::new(
            Opts::new("stream_state", "Current stream lifecycle state"),
            CAMERA_LABEL,
        )?;
        let current_bitrate = IntGaugeVec::new(
            Opts::new("stream_bitrate_bps", "Achieved bitrate scraped from the relay"),
            CAMERA_LABEL,
        )?;
        let target_bitrate = IntGaugeVec::new(
            Opts::new("stream_target_bitrate_bps", "Target bitrate chosen by the ladder"),
            CAMERA_LABEL,
        )?;
        let current_fps = IntGaugeVec::new(
            Opts::new("stream_fps", "Frames per second reported by the relay"),
            CAMERA_LABEL,
        )?;
        let error_count = IntGaugeVec::new(
            Opts::new("stream_errors", "Errors observed since the stream was created"),
            CAMERA_LABEL,
        )?;
        let bytes_sent = IntGaugeVec::new(
            Opts::new("stream_bytes_sent", "Bytes written by the relay process"),
            CAMERA_LABEL,
        )?;
        let packets_lost = IntGaugeVec::new(
            Opts::new("stream_packets_lost", "Packets lost on the outbound link"),
            CAMERA_LABEL,
        )?;
        let restart_attempts = IntCounterVec::new(
            Opts::new("stream_restart_attempts_total", "Restarts of failed streams"),
            CAMERA_LABEL,
        )?;
        let active_streams = IntGauge::new("active_streams", "Streams currently running")?;

        registry.register(Box::new(stream_state.clone()))?;
        registry.register(Box::new(current_bitrate.clone()))?;
        registry.register(Box::new(target_bitrate.clone()))?;
        registry.register(Box::new(current_fps.clone()))?;
        registry.register(Box::new(error_count.clone()))?;
        registry.register(Box::new(bytes_sent.clone()))?;
        registry.register(Box::new(packets_lost.clone()))?;
        registry.register(Box::new(restart_attempts.clone()))?;
        registry.register(Box::new(active_streams.clone()))?;

        Ok(Self {
            registry,
            stream_state,
            current_bitrate,
            target_bitrate,
            current_fps,
            error_count,
            bytes_sent,
            packets_lost,
            restart_attempts,
            active_streams,
        })
    }

    pub fn gather_metrics(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl MetricsReporter for PrometheusReporter {
    fn report_stream_status(&self, status: &StreamStatus) {
        let labels = [status.camera_id.as_str()];
        self.stream_state
            .with_label_values(&labels)
            .set(status.state.as_metric());
        self.current_bitrate
            .with_label_values(&labels)
            .set(clamp(status.current_bitrate));
        self.target_bitrate
            .with_label_values(&labels)
            .set(clamp(status.target_bitrate));
        self.current_fps
            .with_label_values(&labels)
            .set(i64::from(status.current_fps));
        self.error_count
            .with_label_values(&labels)
            .set(clamp(status.error_count));
        self.bytes_sent
            .with_label_values(&labels)
            .set(clamp(status.bytes_sent));
        self.packets_lost
            .with_label_values(&labels)
            .set(clamp(status.packets_lost));
    }

    fn report_stream_removed(&self, camera_id: &str) {
        let labels = [camera_id];
        let _ = self.stream_state.remove_label_values(&labels);
        let _ = self.current_bitrate.remove_label_values(&labels);
        let _ = self.target_bitrate.remove_label_values(&labels);
        let _ = self.current_fps.remove_label_values(&labels);
        let _ = self.error_count.remove_label_values(&labels);
        let _ = self.bytes_sent.remove_label_values(&labels);
        let _ = self.packets_lost.remove_label_values(&labels);
    }

    fn report_active_streams(&self, count: usize) {
        self.active_streams.set(clamp(count as u64));
    }

    fn report_restart_attempt(&self, camera_id: &str) {
        self.restart_attempts.with_label_values(&[camera_id]).inc();
    }
}
