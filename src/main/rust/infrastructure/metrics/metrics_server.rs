use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use warp::Filter;

use super::PrometheusReporter;
use crate::application::services::StreamManager;

/// Health check response structure
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    active_streams: usize,
}

fn with_manager(
    manager: Arc<StreamManager>,
) -> impl Filter<Extract = (Arc<StreamManager>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&manager))
}

/// Serve `/metrics`, `/health`, `/streams` and the liveness and readiness checks until
/// `shutdown` resolves.
pub async fn serve_metrics(
    port: u16,
    reporter: Arc<PrometheusReporter>,
    manager: Arc<StreamManager>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    // CORS configuration for browser access
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    let metrics_route = warp::path("metrics")
        .and(warp::get())
        .and(with_manager(Arc::clone(&manager)))
        .then(move |manager: Arc<StreamManager>| {
            let reporter = Arc::clone(&reporter);
            async move {
                // Refresh per-stream gauges so a scrape never sees stale values
                manager.report_metrics().await;
                warp::reply::with_header(
                    reporter.gather_metrics(),
                    "content-type",
                    "text/plain; version=0.0.4; charset=utf-8",
                )
            }
        });

    let health_route = warp::path("health")
        .and(warp::get())
        .and(with_manager(Arc::clone(&manager)))
        .then(|manager: Arc<StreamManager>| async move {
            let response = HealthResponse {
                status: "healthy",
                service: "pipeline-edge-relay",
                version: env!("CARGO_PKG_VERSION"),
                active_streams: manager.active_count().await,
            };
            warp::reply::json(&response)
        });

    let streams_route = warp::path("streams")
        .and(warp::get())
        .and(with_manager(Arc::clone(&manager)))
        .then(|manager: Arc<StreamManager>| async move {
            warp::reply::json(&manager.list_streams().await)
        });

    // Liveness: the process is up
    let liveness_route =
        warp::path("livez").map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Readiness: the agent can take traffic
    let readiness_route = warp::path("readyz").map(|| {
        warp::reply::with_status("READY", warp::http::StatusCode::OK)
    });

    let routes = metrics_route
        .or(health_route)
        .or(streams_route)
        .or(liveness_route)
        .or(readiness_route)
        .with(cors);

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown)
        .map_err(|e| anyhow::anyhow!("failed to bind metrics server on port {}: {}", port, e))?;

    tracing::info!("Metrics server listening on http://{}", addr);
    server.await;
    tracing::info!("Metrics server stopped");
    Ok(())
}
