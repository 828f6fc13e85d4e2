/// x264 knobs passed to every relay process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingSettings {
    pub preset: String,
    pub tune: String,
    /// Keyframe interval in frames
    pub gop_size: u32,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            preset: "superfast".to_string(),
            tune: "zerolatency".to_string(),
            gop_size: 30,
        }
    }
}
