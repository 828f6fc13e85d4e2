use crate::domain::entities::StreamStatus;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_stream_status(&self, status: &StreamStatus);
    fn report_stream_removed(&self, camera_id: &str);
    fn report_active_streams(&self, count: usize);
    fn report_restart_attempt(&self, camera_id: &str);
}
