use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::domain::errors::Result;
use crate::domain::value_objects::{ProcessExit, RelayJob, Telemetry};

/// Raw diagnostic output of a relay process
pub type Diagnostics = Box<dyn AsyncRead + Send + Unpin>;

/// Port for media relay implementations.
///
/// The stream state machine only ever talks to this trait, so a subprocess
/// encoder can be replaced by one with a structured control channel.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Launch one relay process for the given job
    async fn launch(&self, job: &RelayJob) -> Result<Box<dyn RelayProcess>>;

    /// Extract telemetry from one diagnostic line
    fn scrape(&self, line: &str) -> Telemetry;
}

/// Handle on one running relay process
#[async_trait]
pub trait RelayProcess: Send {
    /// Diagnostic output; yields `Some` once
    fn take_diagnostics(&mut self) -> Option<Diagnostics>;

    /// Wait for the process to exit. Must be cancel safe.
    async fn wait(&mut self) -> Result<ProcessExit>;

    /// Ask the process to wind down on its own
    async fn terminate(&mut self) -> Result<()>;

    /// Forcibly terminate the process
    async fn kill(&mut self) -> Result<()>;
}
