use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::StreamState;

/// Point-in-time copy of one stream's observable fields.
///
/// Always handed out by value; every field comes from the same lock
/// acquisition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamStatus {
    pub camera_id: String,
    pub state: StreamState,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub error_count: u64,
    pub current_bitrate: u64,
    pub target_bitrate: u64,
    pub current_fps: u32,
    pub target_fps: u32,
    pub resolution: String,
    pub bytes_sent: u64,
    pub packets_lost: u64,
    pub profile: String,
}

impl StreamStatus {
    /// Achieved bitrate has fallen below half of the target
    pub fn is_starved(&self) -> bool {
        self.current_bitrate > 0 && self.current_bitrate < self.target_bitrate / 2
    }
}
