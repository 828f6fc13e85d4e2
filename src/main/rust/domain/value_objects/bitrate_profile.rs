use serde::{Deserialize, Serialize};

/// One rung of the quality ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateProfile {
    pub name: String,
    /// Bits per second
    pub bitrate: u64,
    pub fps: u32,
    /// `WxH`; empty keeps the source resolution
    #[serde(default)]
    pub resolution: String,
}

impl BitrateProfile {
    pub fn new(
        name: impl Into<String>,
        bitrate: u64,
        fps: u32,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bitrate,
            fps,
            resolution: resolution.into(),
        }
    }

    pub fn resolution(&self) -> Option<&str> {
        if self.resolution.is_empty() {
            None
        } else {
            Some(&self.resolution)
        }
    }
}
