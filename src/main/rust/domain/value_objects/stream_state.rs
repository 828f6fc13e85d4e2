use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one camera relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Not running; initial and final state
    #[default]
    Stopped,
    /// Relay process is being launched
    Starting,
    /// Relay process is up
    Running,
    /// Stop requested, waiting for the process to exit
    Stopping,
    /// Launch failed or the process died on its own. Terminal.
    Failed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StreamState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Stopped => 0.0,
            Self::Starting => 1.0,
            Self::Running => 2.0,
            Self::Stopping => 3.0,
            Self::Failed => 4.0,
        }
    }

    /// Allowed lifecycle edges
    pub fn can_transition_to(&self, next: StreamState) -> bool {
        matches!(
            (self, next),
            (Self::Stopped, Self::Starting)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::Failed)
                | (Self::Running, Self::Stopping)
                | (Self::Running, Self::Stopped)
                | (Self::Running, Self::Failed)
                | (Self::Stopping, Self::Stopped)
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Stopped or failed: nothing left to supervise
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}
