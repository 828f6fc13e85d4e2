use crate::domain::errors::{DomainError, Result};

const FILE_SINK_PREFIX: &str = "file:";

/// Outbound SRT endpoint shared by every stream.
///
/// Each stream opens its own caller-mode connection, told apart on the
/// receiving side by its `streamid`.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtDestination {
    endpoint: String,
    passphrase: String,
    latency_ms: u32,
    key_length: u32,
}

impl SrtDestination {
    pub fn new(endpoint: String, passphrase: String, latency_ms: u32, key_length: u32) -> Result<Self> {
        Self::validate_endpoint(&endpoint)?;

        if !matches!(key_length, 0 | 16 | 24 | 32) {
            return Err(DomainError::InvalidDestination(format!(
                "key length {} must be one of 0, 16, 24, 32",
                key_length
            )));
        }

        Ok(Self {
            endpoint,
            passphrase,
            latency_ms,
            key_length,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn latency_ms(&self) -> u32 {
        self.latency_ms
    }

    pub fn is_file_sink(&self) -> bool {
        self.endpoint.starts_with(FILE_SINK_PREFIX)
    }

    /// Destination URL for one camera. File sinks are used verbatim.
    pub fn url_for(&self, stream_id: &str) -> String {
        if self.is_file_sink() {
            return self.endpoint.clone();
        }

        format!(
            "{}?mode=caller&latency={}&pbkeylen={}&passphrase={}&streamid={}",
            self.endpoint, self.latency_ms, self.key_length, self.passphrase, stream_id
        )
    }

    fn validate_endpoint(endpoint: &str) -> Result<()> {
        if !endpoint.starts_with("srt://") && !endpoint.starts_with(FILE_SINK_PREFIX) {
            return Err(DomainError::InvalidDestination(endpoint.to_string()));
        }
        if endpoint.starts_with("srt://") && endpoint.contains('?') {
            return Err(DomainError::InvalidDestination(format!(
                "{} must not carry query parameters, they are appended per camera",
                endpoint
            )));
        }
        Ok(())
    }
}
