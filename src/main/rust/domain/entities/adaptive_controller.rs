use crate::domain::value_objects::AdaptiveSettings;

/// Direction of one ladder move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityStep {
    /// One rung towards lower quality (higher index)
    Down,
    /// One rung towards higher quality (lower index)
    Up,
    Hold,
}

/// Result of one controller tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub ewma: f64,
    /// `None` when the target bitrate is zero
    pub utilization: Option<f64>,
    pub step: QualityStep,
}

/// EWMA throughput estimator plus the hysteresis decision rule.
///
/// Pure state machine: the timer loop lives in the application layer.
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    smoothing: f64,
    low_threshold: f64,
    high_threshold: f64,
    ewma: Option<f64>,
}

impl AdaptiveController {
    pub fn new(settings: &AdaptiveSettings) -> Self {
        Self {
            smoothing: settings.smoothing(),
            low_threshold: settings.low_threshold(),
            high_threshold: settings.high_threshold(),
            ewma: None,
        }
    }

    pub fn ewma(&self) -> Option<f64> {
        self.ewma
    }

    /// Fold one throughput sample into the average. The first sample seeds it.
    pub fn observe(&mut self, sample: f64) -> f64 {
        let next = match self.ewma {
            None => sample,
            Some(previous) => self.smoothing * sample + (1.0 - self.smoothing) * previous,
        };
        self.ewma = Some(next);
        next
    }

    pub fn decide(&self, utilization: f64) -> QualityStep {
        if utilization < self.low_threshold {
            QualityStep::Down
        } else if utilization > self.high_threshold {
            QualityStep::Up
        } else {
            QualityStep::Hold
        }
    }

    pub fn evaluate(&mut self, current_bitrate: u64, target_bitrate: u64) -> Evaluation {
        let ewma = self.observe(current_bitrate as f64);

        if target_bitrate == 0 {
            return Evaluation {
                ewma,
                utilization: None,
                step: QualityStep::Hold,
            };
        }

        let utilization = ewma / target_bitrate as f64;
        Evaluation {
            ewma,
            utilization: Some(utilization),
            step: self.decide(utilization),
        }
    }

    /// Ladder index after applying `step`, clamped to the ladder bounds
    pub fn next_index(step: QualityStep, current: usize, ladder_len: usize) -> usize {
        let last = ladder_len.saturating_sub(1);
        match step {
            QualityStep::Down => (current + 1).min(last),
            QualityStep::Up => current.saturating_sub(1).min(last),
            QualityStep::Hold => current.min(last),
        }
    }
}
