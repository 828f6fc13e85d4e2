pub mod alerts;
pub mod ffmpeg;
pub mod metrics;
