use super::{AdaptiveSettings, EncodingSettings, Ladder, SrtDestination};

/// Everything a stream needs besides its camera; shared read-only
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub ladder: Ladder,
    pub encoding: EncodingSettings,
    pub destination: SrtDestination,
    pub adaptive: AdaptiveSettings,
}

impl RelaySettings {
    pub fn new(
        ladder: Ladder,
        encoding: EncodingSettings,
        destination: SrtDestination,
        adaptive: AdaptiveSettings,
    ) -> Self {
        Self {
            ladder,
            encoding,
            destination,
            adaptive,
        }
    }
}
