use std::fmt;

use super::{BitrateProfile, EncodingSettings};

/// Everything an encoder needs to launch one relay process
#[derive(Debug, Clone, PartialEq)]
pub struct RelayJob {
    pub camera_id: String,
    pub input_url: String,
    pub profile: BitrateProfile,
    /// Target bitrate; may differ from the profile after a manual override
    pub bitrate: u64,
    pub encoding: EncodingSettings,
    pub destination_url: String,
}

/// How a relay process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn with_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn signaled() -> Self {
        Self { code: None }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Best-effort values scraped from one diagnostic line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    pub error: Option<String>,
    /// Bits per second
    pub bitrate: Option<u64>,
    pub fps: Option<u32>,
    /// Cumulative bytes written so far
    pub bytes_sent: Option<u64>,
}

impl Telemetry {
    pub fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.bitrate.is_none()
            && self.fps.is_none()
            && self.bytes_sent.is_none()
    }
}
