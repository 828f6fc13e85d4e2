use std::time::Duration;

use crate::domain::errors::{DomainError, Result};

/// Utilization above which the controller steps up one rung
pub const HIGH_UTILIZATION: f64 = 0.95;

/// Weight of the newest throughput sample in the EWMA
pub const DEFAULT_SMOOTHING: f64 = 0.3;

/// Closed-loop bitrate control parameters
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveSettings {
    enabled: bool,
    measurement_window: Duration,
    low_threshold: f64,
    smoothing: f64,
}

impl AdaptiveSettings {
    pub fn new(enabled: bool, measurement_window: Duration, low_threshold: f64) -> Result<Self> {
        if measurement_window.is_zero() {
            return Err(DomainError::InvalidMeasurementWindow);
        }
        if !(low_threshold > 0.0 && low_threshold < HIGH_UTILIZATION) {
            return Err(DomainError::InvalidThreshold(low_threshold));
        }

        Ok(Self {
            enabled,
            measurement_window,
            low_threshold,
            smoothing: DEFAULT_SMOOTHING,
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn measurement_window(&self) -> Duration {
        self.measurement_window
    }

    pub fn low_threshold(&self) -> f64 {
        self.low_threshold
    }

    pub fn high_threshold(&self) -> f64 {
        HIGH_UTILIZATION
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            measurement_window: Duration::from_secs(30),
            low_threshold: 0.8,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}
