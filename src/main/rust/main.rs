use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use pipeline_edge_relay::{
    serve_metrics, Config, FfmpegEncoder, HealthMonitor, PrometheusReporter, ShutdownOutcome,
    StreamManager, TracingAlertSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();
    config.validate()?;

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let agent_file = config.load_agent_file()?;
    let settings = config
        .to_relay_settings(&agent_file)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let cameras = config.to_cameras(&agent_file)?;

    info!("Starting edge relay");
    info!("  Destination: {}", settings.destination.endpoint());
    info!("  Ladder: {} profiles", settings.ladder.len());
    info!("  Adaptive bitrate: {}", settings.adaptive.enabled());
    info!("  Cameras: {}", cameras.len());
    info!("  Metrics port: {}", config.metrics_port);

    // Create infrastructure implementations (dependency injection)
    let reporter = Arc::new(PrometheusReporter::new()?);
    let encoder = Arc::new(FfmpegEncoder::new(config.ffmpeg_path.clone()));
    let alerts = Arc::new(TracingAlertSink::new());

    let manager = Arc::new(
        StreamManager::new(
            Arc::new(settings),
            encoder,
            alerts.clone(),
            reporter.clone(),
        )
        .with_stop_timeout(config.stop_timeout()),
    );

    let shutdown = CancellationToken::new();

    // Start metrics server
    let metrics_server = {
        let signal = shutdown.clone();
        tokio::spawn(serve_metrics(
            config.metrics_port,
            reporter.clone(),
            manager.clone(),
            async move { signal.cancelled().await },
        ))
    };

    for camera in &cameras {
        let camera_id = camera.id.clone();
        match manager.start_stream(camera.clone()).await {
            Ok(()) => info!(camera_id = %camera_id, "Stream started"),
            // The health monitor retries untracked cameras
            Err(e) => error!(camera_id = %camera_id, error = %e, "Failed to start stream"),
        }
    }

    let health = HealthMonitor::new(
        manager.clone(),
        alerts,
        reporter,
        cameras,
        config.health_interval(),
    );
    let health_handle = tokio::spawn(health.run(shutdown.child_token()));

    wait_for_signal().await;
    info!("Received shutdown signal");
    shutdown.cancel();

    if let Err(e) = health_handle.await {
        warn!("Health monitor task failed: {}", e);
    }

    match manager.stop(config.shutdown_timeout()).await {
        ShutdownOutcome::Completed => info!("All streams stopped"),
        ShutdownOutcome::DeadlineExceeded => warn!("Shutdown deadline exceeded"),
    }

    match metrics_server.await {
        Ok(Err(e)) => error!("Metrics server error: {}", e),
        Err(e) => error!("Metrics server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("Edge relay shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl+c: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for ctrl+c: {}", e);
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl+c: {}", e);
    }
}
