use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tokio_util::sync::CancellationToken;

use super::AdaptiveMonitor;
use crate::domain::entities::{StreamLifecycle, StreamStatus};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{AlertSink, Diagnostics, Encoder, RelayProcess};
use crate::domain::value_objects::{
    Alert, BitrateProfile, Camera, ProcessExit, RelayJob, RelaySettings, StreamState, Telemetry,
};

/// Longest diagnostic line scraped; longer lines are skipped
const MAX_DIAGNOSTIC_LINE: usize = 64 * 1024;

/// How long a killed process gets to be reaped after the stop deadline
const FORCE_KILL_GRACE: Duration = Duration::from_secs(5);

struct StreamFields {
    lifecycle: StreamLifecycle,
    last_error: Option<String>,
    error_count: u64,
    current_bitrate: u64,
    target_bitrate: u64,
    current_fps: u32,
    target_fps: u32,
    resolution: String,
    bytes_sent: u64,
    packets_lost: u64,
    profile_index: usize,
}

/// Handles on the tasks supervising a running relay
struct Supervision {
    cancel: CancellationToken,
    kill_switch: CancellationToken,
    exit_waiter: JoinHandle<()>,
    monitor: Option<JoinHandle<()>>,
}

/// Lifecycle owner for one camera's outbound relay.
///
/// Observable fields live behind one lock so that [`Stream::status`] is
/// always a consistent copy. Start and stop are serialized by a second,
/// async lock that also owns the supervision handles.
pub struct Stream {
    camera: Camera,
    settings: Arc<RelaySettings>,
    encoder: Arc<dyn Encoder>,
    alerts: Arc<dyn AlertSink>,
    fields: RwLock<StreamFields>,
    supervision: Mutex<Option<Supervision>>,
}

impl Stream {
    pub fn new(
        camera: Camera,
        settings: Arc<RelaySettings>,
        encoder: Arc<dyn Encoder>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let profile_index = settings.ladder.initial_index();
        let profile = &settings.ladder.profiles()[profile_index];

        let fields = StreamFields {
            lifecycle: StreamLifecycle::new(),
            last_error: None,
            error_count: 0,
            current_bitrate: 0,
            target_bitrate: profile.bitrate,
            current_fps: 0,
            target_fps: profile.fps,
            resolution: profile.resolution.clone(),
            bytes_sent: 0,
            packets_lost: 0,
            profile_index,
        };

        Self {
            camera,
            settings,
            encoder,
            alerts,
            fields: RwLock::new(fields),
            supervision: Mutex::new(None),
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera.id
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn state(&self) -> StreamState {
        self.read_fields().lifecycle.current_state()
    }

    /// Reached `stopped` or `failed` after having been started
    pub fn is_finished(&self) -> bool {
        let fields = self.read_fields();
        fields.lifecycle.current_state().is_terminal() && fields.lifecycle.transition_count() > 0
    }

    /// Consistent snapshot of every observable field
    pub fn status(&self) -> StreamStatus {
        let fields = self.read_fields();
        StreamStatus {
            camera_id: self.camera.id.clone(),
            state: fields.lifecycle.current_state(),
            started_at: fields.lifecycle.started_at(),
            last_error: fields.last_error.clone(),
            error_count: fields.error_count,
            current_bitrate: fields.current_bitrate,
            target_bitrate: fields.target_bitrate,
            current_fps: fields.current_fps,
            target_fps: fields.target_fps,
            resolution: fields.resolution.clone(),
            bytes_sent: fields.bytes_sent,
            packets_lost: fields.packets_lost,
            profile: self.profile_at(fields.profile_index).name.clone(),
        }
    }

    /// Launch the relay and its supervising tasks.
    ///
    /// On launch failure the stream ends up `failed` and the error is
    /// returned; a failed stream cannot be started again.
    pub async fn start(self: &Arc<Self>, parent: &CancellationToken) -> Result<()> {
        let mut supervision = self.supervision.lock().await;

        let job = {
            let mut fields = self.write_fields();
            if fields.lifecycle.current_state().is_running() {
                return Err(DomainError::AlreadyRunning(self.camera.id.clone()));
            }
            fields.lifecycle.transition_to_starting()?;
            self.build_job(&fields)
        };

        let mut process = match self.encoder.launch(&job).await {
            Ok(process) => process,
            Err(e) => {
                let mut fields = self.write_fields();
                fields.last_error = Some(e.to_string());
                fields.lifecycle.transition_to_failed(Some(e.to_string()))?;
                drop(fields);

                tracing::error!(camera_id = %self.camera.id, error = %e, "Stream launch failed");
                return Err(e);
            }
        };

        self.write_fields().lifecycle.transition_to_running()?;

        let cancel = parent.child_token();
        let kill_switch = CancellationToken::new();

        if let Some(diagnostics) = process.take_diagnostics() {
            tokio::spawn(Arc::clone(self).scan_diagnostics(diagnostics));
        }

        let monitor = if self.settings.adaptive.enabled() {
            let monitor = AdaptiveMonitor::new(Arc::clone(&self.settings));
            Some(tokio::spawn(monitor.run(Arc::clone(self), cancel.clone())))
        } else {
            None
        };

        let exit_waiter = tokio::spawn(Arc::clone(self).supervise_exit(
            process,
            cancel.clone(),
            kill_switch.clone(),
        ));

        *supervision = Some(Supervision {
            cancel,
            kill_switch,
            exit_waiter,
            monitor,
        });

        tracing::info!(
            camera_id = %self.camera.id,
            profile = %job.profile.name,
            bitrate = job.bitrate,
            fps = job.profile.fps,
            resolution = %job.profile.resolution,
            "Stream started"
        );

        Ok(())
    }

    /// Stop the relay, killing it if it has not exited by `deadline`.
    ///
    /// A no-op for streams that are already stopped, stopping or failed.
    pub async fn stop(&self, deadline: Instant) -> Result<()> {
        let mut supervision = self.supervision.lock().await;

        {
            let mut fields = self.write_fields();
            match fields.lifecycle.current_state() {
                StreamState::Stopped | StreamState::Stopping | StreamState::Failed => return Ok(()),
                _ => fields.lifecycle.transition_to_stopping()?,
            }
        }

        tracing::info!(camera_id = %self.camera.id, "Stopping stream");

        let mut result = Ok(());
        if let Some(Supervision {
            cancel,
            kill_switch,
            mut exit_waiter,
            monitor,
        }) = supervision.take()
        {
            cancel.cancel();

            match tokio::time::timeout_at(deadline, &mut exit_waiter).await {
                Ok(_) => {
                    tracing::debug!(camera_id = %self.camera.id, "Stream stopped gracefully");
                }
                Err(_) => {
                    tracing::warn!(camera_id = %self.camera.id, "Stop timeout, killing relay process");
                    kill_switch.cancel();
                    if tokio::time::timeout(FORCE_KILL_GRACE, exit_waiter).await.is_err() {
                        result = Err(DomainError::ProcessControl(format!(
                            "relay for camera {} did not exit after kill",
                            self.camera.id
                        )));
                    }
                }
            }

            if let Some(monitor) = monitor {
                monitor.abort();
            }
        }

        let mut fields = self.write_fields();
        if fields.lifecycle.current_state() == StreamState::Stopping {
            fields
                .lifecycle
                .transition_to_stopped(Some("stop requested".to_string()))?;
        }

        result
    }

    /// Convenience wrapper around [`Stream::stop`] with a relative timeout
    pub async fn stop_within(&self, timeout: Duration) -> Result<()> {
        self.stop(Instant::now() + timeout).await
    }

    /// Override the target bitrate. Takes effect on the next launch.
    pub fn update_bitrate(&self, bitrate: u64) {
        let mut fields = self.write_fields();
        tracing::info!(
            camera_id = %self.camera.id,
            old_bitrate = fields.target_bitrate,
            new_bitrate = bitrate,
            "Updating stream bitrate"
        );
        fields.target_bitrate = bitrate;
    }

    /// Switch to ladder rung `index`, overwriting every target field at once
    pub fn apply_profile(&self, index: usize) -> Result<BitrateProfile> {
        let profile = self
            .settings
            .ladder
            .get(index)
            .cloned()
            .ok_or_else(|| DomainError::InvalidProfile {
                name: format!("#{}", index),
                reason: format!("ladder has {} rungs", self.settings.ladder.len()),
            })?;

        let mut fields = self.write_fields();
        fields.profile_index = index;
        fields.target_bitrate = profile.bitrate;
        fields.target_fps = profile.fps;
        fields.resolution = profile.resolution.clone();
        Ok(profile)
    }

    fn build_job(&self, fields: &StreamFields) -> RelayJob {
        let mut profile = self.profile_at(fields.profile_index).clone();
        profile.fps = fields.target_fps;
        profile.resolution = fields.resolution.clone();

        RelayJob {
            camera_id: self.camera.id.clone(),
            input_url: self.camera.input_url(),
            profile,
            bitrate: fields.target_bitrate,
            encoding: self.settings.encoding.clone(),
            destination_url: self.settings.destination.url_for(&self.camera.id),
        }
    }

    fn profile_at(&self, index: usize) -> &BitrateProfile {
        &self.settings.ladder.profiles()[index]
    }

    async fn scan_diagnostics(self: Arc<Self>, diagnostics: Diagnostics) {
        let mut lines = FramedRead::new(diagnostics, Self::diagnostic_codec());

        while let Some(chunk) = lines.next().await {
            match chunk {
                Ok(bytes) if bytes.is_empty() => continue,
                Ok(bytes) => {
                    let line = String::from_utf8_lossy(&bytes);
                    tracing::trace!(camera_id = %self.camera.id, output = %line, "Relay output");
                    self.record_telemetry(self.encoder.scrape(&line));
                }
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    // A decode error ends the frame stream, so keep draining
                    // the process output through a fresh reader
                    tracing::debug!(
                        camera_id = %self.camera.id,
                        limit = MAX_DIAGNOSTIC_LINE,
                        "Oversized relay output line skipped"
                    );
                    lines = FramedRead::new(lines.into_inner(), Self::diagnostic_codec());
                }
                Err(e) => {
                    tracing::warn!(camera_id = %self.camera.id, error = %e, "Diagnostic stream unreadable");
                    break;
                }
            }
        }

        tracing::debug!(camera_id = %self.camera.id, "Diagnostic stream closed");
    }

    fn diagnostic_codec() -> AnyDelimiterCodec {
        // ffmpeg redraws its progress line with bare carriage returns
        AnyDelimiterCodec::new_with_max_length(b"\r\n".to_vec(), Vec::new(), MAX_DIAGNOSTIC_LINE)
    }

    fn record_telemetry(&self, telemetry: Telemetry) {
        if telemetry.is_empty() {
            return;
        }

        let mut fields = self.write_fields();
        if let Some(bitrate) = telemetry.bitrate {
            fields.current_bitrate = bitrate;
        }
        if let Some(fps) = telemetry.fps {
            fields.current_fps = fps;
        }
        if let Some(bytes) = telemetry.bytes_sent {
            fields.bytes_sent = bytes;
        }
        if let Some(error) = telemetry.error {
            fields.error_count += 1;
            fields.last_error = Some(error.clone());
            drop(fields);

            tracing::warn!(camera_id = %self.camera.id, error = %error, "Relay error detected");
        }
    }

    async fn supervise_exit(
        self: Arc<Self>,
        mut process: Box<dyn RelayProcess>,
        cancel: CancellationToken,
        kill_switch: CancellationToken,
    ) {
        let outcome = tokio::select! {
            outcome = process.wait() => outcome,
            _ = cancel.cancelled() => {
                if let Err(e) = process.terminate().await {
                    tracing::warn!(camera_id = %self.camera.id, error = %e, "Graceful shutdown request failed");
                }
                tokio::select! {
                    outcome = process.wait() => outcome,
                    _ = kill_switch.cancelled() => {
                        if let Err(e) = process.kill().await {
                            tracing::error!(camera_id = %self.camera.id, error = %e, "Failed to kill relay process");
                        }
                        process.wait().await
                    }
                }
            }
        };

        self.handle_exit(outcome, cancel.is_cancelled()).await;

        // Lets the adaptive loop wind down after a crash
        cancel.cancel();
    }

    async fn handle_exit(&self, outcome: Result<ProcessExit>, intentional: bool) {
        let alert = {
            let mut fields = self.write_fields();
            let state = fields.lifecycle.current_state();
            let stopping = intentional || state == StreamState::Stopping;

            let failure = match &outcome {
                Ok(exit) if stopping || exit.is_success() => None,
                Ok(exit) => Some(format!("relay exited with {}", exit)),
                Err(_) if stopping => None,
                Err(e) => Some(e.to_string()),
            };

            match failure {
                None => {
                    let reason = match &outcome {
                        Ok(exit) => exit.to_string(),
                        Err(e) => e.to_string(),
                    };
                    if let Err(e) = fields.lifecycle.transition_to_stopped(Some(reason)) {
                        tracing::debug!(camera_id = %self.camera.id, error = %e, "Exit after stream settled");
                    }
                    None
                }
                Some(message) => {
                    fields.error_count += 1;
                    fields.last_error = Some(message.clone());
                    if let Err(e) = fields.lifecycle.transition_to_failed(Some(message.clone())) {
                        tracing::debug!(camera_id = %self.camera.id, error = %e, "Exit after stream settled");
                        None
                    } else {
                        Some(Alert::error(
                            "Stream Failed",
                            format!("Stream for camera {} failed: {}", self.camera.id, message),
                        ))
                    }
                }
            }
        };

        match alert {
            Some(alert) => {
                tracing::error!(camera_id = %self.camera.id, error = %alert.message, "Stream process failed");
                if let Err(e) = self.alerts.send_alert(&alert).await {
                    tracing::warn!(camera_id = %self.camera.id, error = %e, "Failed to send alert");
                }
            }
            None => {
                tracing::info!(camera_id = %self.camera.id, "Relay process exited");
            }
        }
    }

    fn read_fields(&self) -> RwLockReadGuard<'_, StreamFields> {
        self.fields.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_fields(&self) -> RwLockWriteGuard<'_, StreamFields> {
        self.fields.write().unwrap_or_else(PoisonError::into_inner)
    }
}
