mod common;

use std::sync::Arc;

use pipeline_edge_relay::domain::value_objects::ProcessExit;
use pipeline_edge_relay::{
    AdaptiveController, AdaptiveSettings, ArgumentBuilder, BitrateProfile, Camera, DomainError,
    EncodingSettings, Ladder, PrometheusReporter, QualityStep, RelayJob, SrtDestination,
    StreamLifecycle, StreamState,
};

#[test]
fn test_default_ladder_is_ordered_by_quality() {
    let ladder = Ladder::default();
    let names: Vec<&str> = ladder.profiles().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["1080p", "720p", "480p", "360p"]);
    assert!(ladder
        .profiles()
        .windows(2)
        .all(|pair| pair[0].bitrate > pair[1].bitrate));
    assert_eq!(ladder.initial_index(), 2);
}

#[test]
fn test_ladder_validation() {
    assert!(matches!(Ladder::new(vec![]), Err(DomainError::EmptyLadder)));
    assert!(matches!(
        Ladder::new(vec![
            BitrateProfile::new("a", 1000, 10, ""),
            BitrateProfile::new("a", 500, 10, ""),
        ]),
        Err(DomainError::DuplicateProfile(_))
    ));
    assert!(Ladder::new(vec![BitrateProfile::new("a", 1000, 10, "wide")]).is_err());
    assert!(Ladder::new(vec![BitrateProfile::new("a", 0, 10, "")]).is_err());
}

#[test]
fn test_destination_url_per_camera() {
    let destination = SrtDestination::new(
        "srt://cloud.example.com:9000".to_string(),
        "0123456789".to_string(),
        1000,
        16,
    )
    .unwrap();

    assert_eq!(
        destination.url_for("cam1"),
        "srt://cloud.example.com:9000?mode=caller&latency=1000&pbkeylen=16&passphrase=0123456789&streamid=cam1"
    );

    let sink = SrtDestination::new("file:/tmp/out.ts".to_string(), String::new(), 1000, 16).unwrap();
    assert_eq!(sink.url_for("cam1"), "file:/tmp/out.ts");

    assert!(SrtDestination::new("udp://host:1".to_string(), String::new(), 1000, 16).is_err());
}

#[test]
fn test_job_arguments_end_to_end() {
    let camera = Camera::new("cam1", "rtsp://10.0.0.5/stream1").with_credentials("admin", "pw");
    let destination =
        SrtDestination::new("srt://cloud:9000".to_string(), "0123456789".to_string(), 500, 0)
            .unwrap();
    let profile = BitrateProfile::new("480p", 1_000_000, 15, "854x480");

    let job = RelayJob {
        camera_id: camera.id.clone(),
        input_url: camera.input_url(),
        profile: profile.clone(),
        bitrate: profile.bitrate,
        encoding: EncodingSettings::default(),
        destination_url: destination.url_for(&camera.id),
    };
    let args = ArgumentBuilder::build_args(&job);

    let input = args.iter().position(|a| a == "-i").unwrap();
    assert_eq!(args[input + 1], "rtsp://admin:pw@10.0.0.5/stream1");
    assert!(args.windows(2).any(|w| w[0] == "-b:v" && w[1] == "1000000"));
    assert!(args.windows(2).any(|w| w[0] == "-s" && w[1] == "854x480"));
    assert!(args.last().unwrap().ends_with("streamid=cam1"));
}

#[test]
fn test_lifecycle_rejects_illegal_edges() {
    let mut lifecycle = StreamLifecycle::new();
    assert!(lifecycle.transition_to_running().is_err());
    lifecycle.transition_to_starting().unwrap();
    lifecycle.transition_to_failed(Some("boom".to_string())).unwrap();
    assert!(lifecycle.transition_to_starting().is_err());
    assert_eq!(lifecycle.current_state(), StreamState::Failed);
}

#[test]
fn test_ladder_walk_under_constrained_link() {
    let ladder = Ladder::default();
    let mut controller = AdaptiveController::new(&AdaptiveSettings::default());
    let mut index = ladder.initial_index();

    // Link carries half of whatever is asked for
    for _ in 0..5 {
        let target = ladder.get(index).unwrap().bitrate;
        let evaluation = controller.evaluate(target / 2, target);
        let next = AdaptiveController::next_index(evaluation.step, index, ladder.len());
        assert!(next.abs_diff(index) <= 1);
        index = next;
    }
    assert_eq!(index, ladder.last_index());

    // Zero target never moves
    let evaluation = controller.evaluate(1_000, 0);
    assert_eq!(evaluation.step, QualityStep::Hold);
}

#[test]
fn test_two_rung_controller_clamps_at_bottom() {
    let ladder = Ladder::new(vec![
        BitrateProfile::new("720p", 800_000, 25, "1280x720"),
        BitrateProfile::new("360p", 400_000, 15, "640x360"),
    ])
    .unwrap();
    assert_eq!(ladder.initial_index(), 1);

    let controller = AdaptiveController::new(&AdaptiveSettings::default());
    let mut index = 0;
    for _ in 0..3 {
        index = AdaptiveController::next_index(controller.decide(0.5), index, ladder.len());
        assert_eq!(index, 1);
    }
    assert_eq!(ladder.get(index).unwrap().name, "360p");
}

#[test]
fn test_process_exit_display() {
    assert_eq!(ProcessExit::with_code(1).to_string(), "exit status 1");
    assert_eq!(ProcessExit::signaled().to_string(), "terminated by signal");
    assert!(ProcessExit::success().is_success());
}

#[test]
fn test_reporter_instances_coexist() {
    assert!(PrometheusReporter::new().is_ok());
    assert!(PrometheusReporter::new().is_ok());
}

#[cfg(unix)]
mod with_process {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::common::{eventually_async, settings, NullMetrics, RecordingAlertSink};
    use pipeline_edge_relay::{FfmpegEncoder, StreamManager};

    /// Stand-in for ffmpeg: one progress line on stderr, exits once stdin closes
    const RELAY_SCRIPT: &str = "#!/bin/sh\n\
        printf 'frame=   25 fps= 25 q=28.0 size=     128kB time=00:00:01.00 bitrate= 800.0kbits/s speed=1x\\r' >&2\n\
        read -r cmd\n\
        exit 0\n";

    const CRASH_SCRIPT: &str = "#!/bin/sh\n\
        echo 'Connection to tcp://10.0.0.5:554 failed: Connection refused' >&2\n\
        exit 3\n";

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn manager(program: PathBuf, alerts: Arc<RecordingAlertSink>) -> Arc<StreamManager> {
        Arc::new(StreamManager::new(
            settings(),
            Arc::new(FfmpegEncoder::new(program)),
            alerts,
            Arc::new(NullMetrics),
        ))
    }

    #[tokio::test]
    async fn test_real_process_reports_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = Arc::new(RecordingAlertSink::default());
        let manager = manager(script(dir.path(), "relay.sh", RELAY_SCRIPT), alerts.clone());

        manager
            .start_stream(Camera::new("cam1", "rtsp://10.0.0.5/stream1"))
            .await
            .unwrap();

        let watched = manager.clone();
        assert!(
            eventually_async(|| {
                let watched = watched.clone();
                async move {
                    watched
                        .get_status("cam1")
                        .await
                        .map(|s| s.current_bitrate == 800_000)
                        .unwrap_or(false)
                }
            })
            .await
        );

        manager.stop_stream("cam1").await.unwrap();
        assert!(manager.list_streams().await.is_empty());
        assert!(alerts.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_real_process_crash_raises_alert() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = Arc::new(RecordingAlertSink::default());
        let manager = manager(script(dir.path(), "crash.sh", CRASH_SCRIPT), alerts.clone());

        manager
            .start_stream(Camera::new("cam1", "rtsp://10.0.0.5/stream1"))
            .await
            .unwrap();

        let watched = manager.clone();
        assert!(
            eventually_async(|| {
                let watched = watched.clone();
                async move {
                    watched
                        .get_status("cam1")
                        .await
                        .map(|s| s.state == StreamState::Failed)
                        .unwrap_or(false)
                }
            })
            .await
        );

        let watched = alerts.clone();
        assert!(
            eventually_async(|| {
                let watched = watched.clone();
                async move { watched.titled("Stream Failed") == 1 }
            })
            .await
        );
        let status = manager.get_status("cam1").await.unwrap();
        assert!(status.last_error.unwrap().contains("exit status 3"));
    }

    #[tokio::test]
    async fn test_missing_program_fails_start() {
        let manager = manager(
            PathBuf::from("/nonexistent/ffmpeg"),
            Arc::new(RecordingAlertSink::default()),
        );
        let result = manager
            .start_stream(Camera::new("cam1", "rtsp://10.0.0.5/stream1"))
            .await;
        assert!(matches!(result, Err(DomainError::LaunchFailed(_))));
    }
}
