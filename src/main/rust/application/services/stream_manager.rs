use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::Stream;
use crate::domain::entities::StreamStatus;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{AlertSink, Encoder, MetricsReporter};
use crate::domain::value_objects::{Camera, RelaySettings, StreamState};

/// Default bound for a single [`StreamManager::stop_stream`] call
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// How a [`StreamManager::stop`] call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every stream acknowledged the stop before the deadline
    Completed,
    /// The deadline passed first; stragglers are being killed in the background
    DeadlineExceeded,
}

/// Registry of per-camera streams keyed by camera id
pub struct StreamManager {
    settings: Arc<RelaySettings>,
    encoder: Arc<dyn Encoder>,
    alerts: Arc<dyn AlertSink>,
    metrics: Arc<dyn MetricsReporter>,
    stop_timeout: Duration,
    streams: RwLock<HashMap<String, Arc<Stream>>>,
    root: CancellationToken,
}

impl StreamManager {
    pub fn new(
        settings: Arc<RelaySettings>,
        encoder: Arc<dyn Encoder>,
        alerts: Arc<dyn AlertSink>,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            settings,
            encoder,
            alerts,
            metrics,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            streams: RwLock::new(HashMap::new()),
            root: CancellationToken::new(),
        }
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Create and start a stream for `camera`.
    ///
    /// A tracked stream that is stopped or failed is replaced; any other
    /// tracked stream makes this fail with `AlreadyExists`. The stream stays
    /// tracked only if its start succeeds.
    pub async fn start_stream(&self, camera: Camera) -> Result<()> {
        camera.validate()?;
        let camera_id = camera.id.clone();

        let stream = Arc::new(Stream::new(
            camera,
            Arc::clone(&self.settings),
            Arc::clone(&self.encoder),
            Arc::clone(&self.alerts),
        ));

        let existing = self.streams.read().await.get(&camera_id).cloned();
        if let Some(existing) = &existing {
            if !existing.is_finished() {
                return Err(DomainError::AlreadyExists(camera_id));
            }
            tracing::info!(camera_id = %camera_id, state = %existing.state(), "Replacing stream");
        }

        {
            let mut streams = self.streams.write().await;
            // Someone else registered this camera while the lock was released
            let replaced = match (streams.get(&camera_id), &existing) {
                (None, _) => true,
                (Some(tracked), Some(existing)) => Arc::ptr_eq(tracked, existing),
                (Some(_), None) => false,
            };
            if !replaced {
                return Err(DomainError::AlreadyExists(camera_id));
            }
            streams.insert(camera_id.clone(), Arc::clone(&stream));
        }

        if let Err(e) = stream.start(&self.root).await {
            let mut streams = self.streams.write().await;
            if streams
                .get(&camera_id)
                .is_some_and(|tracked| Arc::ptr_eq(tracked, &stream))
            {
                streams.remove(&camera_id);
            }
            drop(streams);

            self.metrics.report_stream_removed(&camera_id);
            return Err(e);
        }

        self.metrics.report_stream_status(&stream.status());
        tracing::info!(camera_id = %camera_id, "Stream registered");
        Ok(())
    }

    /// Stop and untrack one stream. The entry is removed even when the stop
    /// itself reports an error.
    pub async fn stop_stream(&self, camera_id: &str) -> Result<()> {
        let stream = self.lookup(camera_id).await?;
        let result = stream.stop_within(self.stop_timeout).await;

        {
            let mut streams = self.streams.write().await;
            if streams
                .get(camera_id)
                .is_some_and(|tracked| Arc::ptr_eq(tracked, &stream))
            {
                streams.remove(camera_id);
            }
        }
        self.metrics.report_stream_removed(camera_id);

        if let Err(e) = &result {
            tracing::error!(camera_id = %camera_id, error = %e, "Error stopping stream");
        }
        result
    }

    pub async fn get_status(&self, camera_id: &str) -> Result<StreamStatus> {
        Ok(self.lookup(camera_id).await?.status())
    }

    /// Snapshot of every tracked stream, ordered by camera id
    pub async fn list_streams(&self) -> Vec<StreamStatus> {
        let mut statuses: Vec<StreamStatus> = self
            .snapshot()
            .await
            .iter()
            .map(|stream| stream.status())
            .collect();
        statuses.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));
        statuses
    }

    pub async fn update_bitrate(&self, camera_id: &str, bitrate: u64) -> Result<()> {
        self.lookup(camera_id).await?.update_bitrate(bitrate);
        Ok(())
    }

    /// Cameras whose stream has failed and is waiting for a restart
    pub async fn failed_cameras(&self) -> Vec<Camera> {
        self.snapshot()
            .await
            .iter()
            .filter(|stream| stream.state() == StreamState::Failed)
            .map(|stream| stream.camera().clone())
            .collect()
    }

    /// Number of streams currently in the running state
    pub async fn active_count(&self) -> usize {
        self.snapshot()
            .await
            .iter()
            .filter(|stream| stream.state().is_running())
            .count()
    }

    /// Push every stream's status to the metrics sink
    pub async fn report_metrics(&self) -> Vec<StreamStatus> {
        let statuses = self.list_streams().await;
        let active = statuses.iter().filter(|s| s.state.is_running()).count();
        for status in &statuses {
            self.metrics.report_stream_status(status);
        }
        self.metrics.report_active_streams(active);
        statuses
    }

    /// Stop every stream concurrently, waiting no longer than `timeout`.
    ///
    /// Streams still running at the deadline are killed in the background.
    /// The manager must not be used to start streams afterwards.
    pub async fn stop(&self, timeout: Duration) -> ShutdownOutcome {
        let deadline = Instant::now() + timeout;
        let streams = self.snapshot().await;

        tracing::info!(count = streams.len(), ?timeout, "Stopping stream manager");

        let stops: Vec<_> = streams
            .into_iter()
            .map(|stream| {
                tokio::spawn(async move {
                    if let Err(e) = stream.stop(deadline).await {
                        tracing::error!(camera_id = %stream.camera_id(), error = %e, "Error stopping stream");
                    }
                })
            })
            .collect();

        let outcome = match tokio::time::timeout_at(deadline, join_all(stops)).await {
            Ok(_) => {
                tracing::info!("All streams stopped");
                ShutdownOutcome::Completed
            }
            Err(_) => {
                tracing::warn!("Stop deadline reached, some streams may not have stopped gracefully");
                ShutdownOutcome::DeadlineExceeded
            }
        };

        self.root.cancel();
        outcome
    }

    // The registry lock is never held while calling into a stream
    async fn snapshot(&self) -> Vec<Arc<Stream>> {
        self.streams.read().await.values().cloned().collect()
    }

    async fn lookup(&self, camera_id: &str) -> Result<Arc<Stream>> {
        self.streams
            .read()
            .await
            .get(camera_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(camera_id.to_string()))
    }
}
