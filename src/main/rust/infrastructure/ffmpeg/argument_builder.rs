use crate::domain::value_objects::RelayJob;

/// Socket I/O timeout for RTSP sources, in microseconds
const RTSP_SOCKET_TIMEOUT_US: u64 = 5_000_000;

/// Upper bound between reconnection attempts for HTTP sources, in seconds
const RECONNECT_DELAY_MAX_SECS: u32 = 5;

pub struct ArgumentBuilder;

impl ArgumentBuilder {
    /// Build the ffmpeg argument list for one camera relay.
    ///
    /// Re-encodes with libx264 at the job's bitrate and frame rate, muxes to
    /// MPEG-TS and flushes every packet so SRT sees a steady flow.
    pub fn build_args(job: &RelayJob) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];

        // Input side reconnection tolerance
        if job.input_url.starts_with("rtsp://") || job.input_url.starts_with("rtsps://") {
            args.extend([
                "-rtsp_transport".into(),
                "tcp".into(),
                "-timeout".into(),
                RTSP_SOCKET_TIMEOUT_US.to_string(),
            ]);
        } else if job.input_url.starts_with("http://") || job.input_url.starts_with("https://") {
            args.extend([
                "-reconnect".into(),
                "1".into(),
                "-reconnect_streamed".into(),
                "1".into(),
                "-reconnect_delay_max".into(),
                RECONNECT_DELAY_MAX_SECS.to_string(),
            ]);
        }

        args.extend(["-i".into(), job.input_url.clone()]);

        args.extend([
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            job.encoding.preset.clone(),
            "-tune".into(),
            job.encoding.tune.clone(),
            "-b:v".into(),
            job.bitrate.to_string(),
            "-maxrate".into(),
            job.bitrate.to_string(),
            "-bufsize".into(),
            (job.bitrate * 2).to_string(),
            "-r".into(),
            job.profile.fps.to_string(),
            "-g".into(),
            job.encoding.gop_size.to_string(),
        ]);

        if let Some(resolution) = job.profile.resolution() {
            args.extend(["-s".into(), resolution.to_string()]);
        }

        args.extend([
            "-an".into(),
            "-f".into(),
            "mpegts".into(),
            "-flush_packets".into(),
            "1".into(),
            job.destination_url.clone(),
        ]);

        args
    }
}
