use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use super::{progress_parser, ArgumentBuilder};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{Diagnostics, Encoder, RelayProcess};
use crate::domain::value_objects::{ProcessExit, RelayJob, Telemetry};

/// Relay encoder backed by one ffmpeg subprocess per camera
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn build_command(&self, job: &RelayJob) -> Command {
        let args = ArgumentBuilder::build_args(job);
        tracing::trace!(camera_id = %job.camera_id, ?args, "ffmpeg arguments");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn launch(&self, job: &RelayJob) -> Result<Box<dyn RelayProcess>> {
        let mut child = self.build_command(job).spawn().map_err(|e| {
            DomainError::LaunchFailed(format!("{}: {}", self.program.display(), e))
        })?;

        tracing::info!(
            camera_id = %job.camera_id,
            pid = ?child.id(),
            profile = %job.profile.name,
            bitrate = job.bitrate,
            fps = job.profile.fps,
            "ffmpeg relay launched"
        );

        let stdin = child.stdin.take();
        Ok(Box::new(FfmpegProcess { child, stdin }))
    }

    fn scrape(&self, line: &str) -> Telemetry {
        progress_parser::parse_line(line)
    }
}

struct FfmpegProcess {
    child: Child,
    stdin: Option<ChildStdin>,
}

#[async_trait]
impl RelayProcess for FfmpegProcess {
    fn take_diagnostics(&mut self) -> Option<Diagnostics> {
        self.child
            .stderr
            .take()
            .map(|stderr| Box::new(stderr) as Diagnostics)
    }

    async fn wait(&mut self) -> Result<ProcessExit> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| DomainError::ProcessControl(e.to_string()))?;

        Ok(match status.code() {
            Some(code) => ProcessExit::with_code(code),
            None => ProcessExit::signaled(),
        })
    }

    async fn terminate(&mut self) -> Result<()> {
        // ffmpeg finishes the current segment and exits on `q`
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };

        match stdin.write_all(b"q").await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            Err(e) => Err(DomainError::ProcessControl(e.to_string())),
        }
    }

    async fn kill(&mut self) -> Result<()> {
        match self.child.kill().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(DomainError::ProcessControl(e.to_string())),
        }
    }
}
