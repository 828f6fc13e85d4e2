use thiserror::Error;

use crate::domain::value_objects::StreamState;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Stream already exists for camera {0}")]
    AlreadyExists(String),

    #[error("Stream not found for camera {0}")]
    NotFound(String),

    #[error("Stream already running for camera {0}")]
    AlreadyRunning(String),

    #[error("Invalid stream transition from {from} to {to}")]
    InvalidTransition { from: StreamState, to: StreamState },

    #[error("Failed to launch relay process: {0}")]
    LaunchFailed(String),

    #[error("Relay process control failed: {0}")]
    ProcessControl(String),

    #[error("Bitrate ladder must contain at least one profile")]
    EmptyLadder,

    #[error("Duplicate bitrate profile name: {0}")]
    DuplicateProfile(String),

    #[error("Invalid bitrate profile {name}: {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("Invalid utilization threshold: {0} (must be within 0.0..0.95)")]
    InvalidThreshold(f64),

    #[error("Invalid measurement window: must be greater than zero")]
    InvalidMeasurementWindow,

    #[error("Invalid source URL: {0}")]
    InvalidSourceUrl(String),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Alert delivery failed: {0}")]
    AlertDelivery(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
