use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::StreamState;

/// Older transitions are dropped past this many entries
const MAX_HISTORY: usize = 64;

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: StreamState,
    pub to: StreamState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Domain entity enforcing the stream lifecycle edges
#[derive(Debug)]
pub struct StreamLifecycle {
    current_state: StreamState,
    state_history: Vec<StateTransition>,
    started_at: Option<DateTime<Utc>>,
    running_since: Option<Instant>,
}

impl StreamLifecycle {
    pub fn new() -> Self {
        Self {
            current_state: StreamState::Stopped,
            state_history: Vec::new(),
            started_at: None,
            running_since: None,
        }
    }

    pub fn current_state(&self) -> StreamState {
        self.current_state
    }

    /// Wall-clock time of the last successful launch
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.running_since.map(|start| start.elapsed())
    }

    pub fn transition_count(&self) -> usize {
        self.state_history.len()
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.state_history.last()
    }

    pub fn transition_to_starting(&mut self) -> Result<()> {
        self.record_transition(StreamState::Starting, None)
    }

    pub fn transition_to_running(&mut self) -> Result<()> {
        self.record_transition(StreamState::Running, None)?;
        self.started_at = Some(Utc::now());
        self.running_since = Some(Instant::now());
        Ok(())
    }

    pub fn transition_to_stopping(&mut self) -> Result<()> {
        self.record_transition(StreamState::Stopping, None)
    }

    pub fn transition_to_stopped(&mut self, reason: Option<String>) -> Result<()> {
        self.record_transition(StreamState::Stopped, reason)?;
        self.running_since = None;
        Ok(())
    }

    pub fn transition_to_failed(&mut self, reason: Option<String>) -> Result<()> {
        self.record_transition(StreamState::Failed, reason)?;
        self.running_since = None;
        Ok(())
    }

    fn record_transition(&mut self, new_state: StreamState, reason: Option<String>) -> Result<()> {
        if !self.current_state.can_transition_to(new_state) {
            return Err(DomainError::InvalidTransition {
                from: self.current_state,
                to: new_state,
            });
        }

        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        if self.state_history.len() == MAX_HISTORY {
            self.state_history.remove(0);
        }
        self.state_history.push(transition);
        self.current_state = new_state;
        Ok(())
    }
}

impl Default for StreamLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
