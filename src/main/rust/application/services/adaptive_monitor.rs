use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::Stream;
use crate::domain::entities::{AdaptiveController, QualityStep};
use crate::domain::value_objects::{RelaySettings, StreamState};

/// Periodic bitrate ladder control for one stream.
///
/// Each tick folds the scraped bitrate into an EWMA, compares it with the
/// target and moves at most one rung. A new rung only rewrites the stream's
/// targets; the running process keeps its launch parameters.
pub struct AdaptiveMonitor {
    settings: Arc<RelaySettings>,
    controller: AdaptiveController,
}

impl AdaptiveMonitor {
    pub fn new(settings: Arc<RelaySettings>) -> Self {
        let controller = AdaptiveController::new(&settings.adaptive);
        Self {
            settings,
            controller,
        }
    }

    pub async fn run(mut self, stream: Arc<Stream>, cancel: CancellationToken) {
        let window = self.settings.adaptive.measurement_window();
        let mut ticker = interval_at(Instant::now() + window, window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(camera_id = %stream.camera_id(), ?window, "Adaptive monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick(&stream);
                }
            }
        }

        tracing::debug!(camera_id = %stream.camera_id(), "Adaptive monitor stopped");
    }

    /// One evaluation. Returns the new ladder index when the rung changed.
    pub fn tick(&mut self, stream: &Stream) -> Option<usize> {
        let status = stream.status();
        if status.state != StreamState::Running {
            return None;
        }

        // Nothing scraped yet; a zero here would read as a collapsed link
        if status.current_bitrate == 0 && self.controller.ewma().is_none() {
            return None;
        }

        let evaluation = self
            .controller
            .evaluate(status.current_bitrate, status.target_bitrate);

        let Some(utilization) = evaluation.utilization else {
            tracing::debug!(camera_id = %status.camera_id, "Target bitrate is zero, skipping tick");
            return None;
        };

        tracing::debug!(
            camera_id = %status.camera_id,
            ewma = evaluation.ewma,
            utilization,
            profile = %status.profile,
            "Adaptive tick"
        );

        let ladder = &self.settings.ladder;
        let Some(current) = ladder.index_of(&status.profile) else {
            tracing::warn!(camera_id = %status.camera_id, profile = %status.profile, "Profile not on ladder");
            return None;
        };

        let next = AdaptiveController::next_index(evaluation.step, current, ladder.len());
        if next == current {
            return None;
        }

        match stream.apply_profile(next) {
            Ok(profile) => {
                let direction = match evaluation.step {
                    QualityStep::Down => "Downgrading",
                    _ => "Upgrading",
                };
                tracing::info!(
                    camera_id = %status.camera_id,
                    from = %status.profile,
                    to = %profile.name,
                    bitrate = profile.bitrate,
                    utilization,
                    "{} stream quality",
                    direction
                );
                Some(next)
            }
            Err(e) => {
                tracing::warn!(camera_id = %status.camera_id, error = %e, "Failed to apply profile");
                None
            }
        }
    }
}
