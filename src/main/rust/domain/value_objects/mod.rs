mod adaptive_settings;
mod alert;
mod bitrate_profile;
mod camera;
mod encoding_settings;
mod ladder;
mod relay_job;
mod relay_settings;
mod srt_destination;
mod stream_state;

pub use adaptive_settings::{AdaptiveSettings, DEFAULT_SMOOTHING, HIGH_UTILIZATION};
pub use alert::{Alert, AlertLevel};
pub use bitrate_profile::BitrateProfile;
pub use camera::{Camera, Credentials};
pub use encoding_settings::EncodingSettings;
pub use ladder::Ladder;
pub use relay_job::{ProcessExit, RelayJob, Telemetry};
pub use relay_settings::RelaySettings;
pub use srt_destination::SrtDestination;
pub use stream_state::StreamState;
