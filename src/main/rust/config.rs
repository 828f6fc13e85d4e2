use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Deserialize;

use crate::domain::value_objects::{
    AdaptiveSettings, BitrateProfile, Camera, EncodingSettings, Ladder, RelaySettings,
    SrtDestination, HIGH_UTILIZATION,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pipeline-edge-relay",
    version = "0.1.0",
    author = "Hawkeye Video Pipeline",
    about = "Edge relay pushing camera streams to the cloud over SRT with adaptive bitrate"
)]
pub struct Config {
    /// SRT endpoint streams are pushed to (srt://host:port or file:path)
    #[arg(long, env = "SRT_DESTINATION", default_value = "srt://localhost:9000")]
    pub destination: String,

    /// SRT encryption passphrase (10 to 79 characters)
    #[arg(long, env = "SRT_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// SRT latency in milliseconds
    #[arg(long, env = "SRT_LATENCY_MS", default_value = "1000")]
    pub latency_ms: u32,

    /// SRT key length (0, 16, 24 or 32)
    #[arg(long, env = "SRT_KEY_LENGTH", default_value = "16")]
    pub key_length: u32,

    /// Path to the ffmpeg binary
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// x264 preset
    #[arg(long, env = "ENCODER_PRESET", default_value = "superfast")]
    pub preset: String,

    /// x264 tune
    #[arg(long, env = "ENCODER_TUNE", default_value = "zerolatency")]
    pub tune: String,

    /// Keyframe interval in frames
    #[arg(long, env = "ENCODER_GOP_SIZE", default_value = "30")]
    pub gop_size: u32,

    /// Enable adaptive bitrate control
    #[arg(long, env = "ADAPTIVE_BITRATE", default_value = "true", action = ArgAction::Set)]
    pub adaptive: bool,

    /// Adaptive measurement window in seconds
    #[arg(long, env = "MEASUREMENT_WINDOW", default_value = "30")]
    pub measurement_window: u64,

    /// Utilization below which quality is reduced
    #[arg(long, env = "LOW_THRESHOLD", default_value = "0.8")]
    pub low_threshold: f64,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "8080")]
    pub metrics_port: u16,

    /// Seconds between health checks
    #[arg(long, env = "HEALTH_INTERVAL", default_value = "30")]
    pub health_interval: u64,

    /// Seconds a single stream gets to stop before it is killed
    #[arg(long, env = "STOP_TIMEOUT", default_value = "10")]
    pub stop_timeout: u64,

    /// Seconds the whole agent gets to shut down
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value = "30")]
    pub shutdown_timeout: u64,

    /// TOML file with `[[ladder]]` and `[[cameras]]` tables
    #[arg(short, long, env = "AGENT_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Extra camera as ID=URL; may be repeated
    #[arg(long = "camera", value_name = "ID=URL")]
    pub cameras: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

/// SRT accepts passphrases of 10 to 79 characters
const PASSPHRASE_LEN: std::ops::RangeInclusive<usize> = 10..=79;

/// Contents of the optional agent file
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentFile {
    #[serde(default)]
    pub ladder: Vec<BitrateProfile>,
    #[serde(default)]
    pub cameras: Vec<CameraEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraEntry {
    #[serde(flatten)]
    pub camera: Camera,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl AgentFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read agent config {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse agent config {}", path.display()))
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let is_srt = self.destination.starts_with("srt://");
        if !is_srt && !self.destination.starts_with("file:") {
            anyhow::bail!("Destination must start with srt:// or file:");
        }

        if is_srt && self.key_length != 0 {
            let length = self.passphrase.as_deref().map(str::len).unwrap_or(0);
            if !PASSPHRASE_LEN.contains(&length) {
                anyhow::bail!(
                    "SRT passphrase must be {} to {} characters",
                    PASSPHRASE_LEN.start(),
                    PASSPHRASE_LEN.end()
                );
            }
        }

        Self::validate_port(self.metrics_port, "metrics")?;

        if self.measurement_window == 0 {
            anyhow::bail!("Measurement window cannot be 0");
        }

        if !(self.low_threshold > 0.0 && self.low_threshold < HIGH_UTILIZATION) {
            anyhow::bail!(
                "Low threshold must be between 0 and {} (got {})",
                HIGH_UTILIZATION,
                self.low_threshold
            );
        }

        if self.gop_size == 0 {
            anyhow::bail!("GOP size cannot be 0");
        }

        if self.health_interval == 0 {
            anyhow::bail!("Health interval cannot be 0");
        }

        if self.shutdown_timeout < self.stop_timeout {
            anyhow::bail!(
                "Shutdown timeout ({}) cannot be less than stop timeout ({})",
                self.shutdown_timeout,
                self.stop_timeout
            );
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn load_agent_file(&self) -> anyhow::Result<AgentFile> {
        match &self.config_file {
            Some(path) => AgentFile::load(path),
            None => Ok(AgentFile::default()),
        }
    }

    pub fn to_relay_settings(&self, file: &AgentFile) -> crate::domain::errors::Result<RelaySettings> {
        let ladder = if file.ladder.is_empty() {
            Ladder::default()
        } else {
            Ladder::new(file.ladder.clone())?
        };

        let encoding = EncodingSettings {
            preset: self.preset.clone(),
            tune: self.tune.clone(),
            gop_size: self.gop_size,
        };

        let destination = SrtDestination::new(
            self.destination.clone(),
            self.passphrase.clone().unwrap_or_default(),
            self.latency_ms,
            self.key_length,
        )?;

        let adaptive = AdaptiveSettings::new(
            self.adaptive,
            Duration::from_secs(self.measurement_window),
            self.low_threshold,
        )?;

        Ok(RelaySettings::new(ladder, encoding, destination, adaptive))
    }

    /// Enabled cameras from the agent file followed by `--camera` entries
    pub fn to_cameras(&self, file: &AgentFile) -> anyhow::Result<Vec<Camera>> {
        let mut cameras: Vec<Camera> = file
            .cameras
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.camera.clone())
            .collect();

        for arg in &self.cameras {
            let (id, url) = arg
                .split_once('=')
                .with_context(|| format!("camera '{}' must look like ID=URL", arg))?;
            cameras.push(Camera::new(id.trim(), url.trim()));
        }

        let mut seen = HashSet::new();
        for camera in &cameras {
            camera.validate()?;
            if !seen.insert(camera.id.as_str()) {
                anyhow::bail!("Camera '{}' is configured more than once", camera.id);
            }
        }

        Ok(cameras)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval)
    }
}
