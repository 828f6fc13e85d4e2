use std::collections::HashSet;

use super::BitrateProfile;
use crate::domain::errors::{DomainError, Result};

/// Ordered quality profiles, index 0 = highest quality.
///
/// Read-only after construction and shared between streams behind an `Arc`.
/// Profile names are the lookup key and must be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    profiles: Vec<BitrateProfile>,
}

impl Ladder {
    pub fn new(profiles: Vec<BitrateProfile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(DomainError::EmptyLadder);
        }

        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.name.as_str()) {
                return Err(DomainError::DuplicateProfile(profile.name.clone()));
            }
            Self::validate_profile(profile)?;
        }

        Ok(Self { profiles })
    }

    fn validate_profile(profile: &BitrateProfile) -> Result<()> {
        let invalid = |reason: &str| DomainError::InvalidProfile {
            name: profile.name.clone(),
            reason: reason.to_string(),
        };

        if profile.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if profile.bitrate == 0 {
            return Err(invalid("bitrate must be greater than zero"));
        }
        if profile.fps == 0 {
            return Err(invalid("fps must be greater than zero"));
        }
        if let Some(resolution) = profile.resolution() {
            let valid = resolution
                .split_once('x')
                .map(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok())
                .unwrap_or(false);
            if !valid {
                return Err(invalid("resolution must look like WIDTHxHEIGHT"));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BitrateProfile> {
        self.profiles.get(index)
    }

    pub fn profiles(&self) -> &[BitrateProfile] {
        &self.profiles
    }

    pub fn last_index(&self) -> usize {
        self.profiles.len() - 1
    }

    /// Rung new streams start on
    pub fn initial_index(&self) -> usize {
        self.profiles.len() / 2
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }
}

impl Default for Ladder {
    fn default() -> Self {
        Self {
            profiles: vec![
                BitrateProfile::new("1080p", 4_000_000, 25, "1920x1080"),
                BitrateProfile::new("720p", 2_000_000, 20, "1280x720"),
                BitrateProfile::new("480p", 1_000_000, 15, "854x480"),
                BitrateProfile::new("360p", 500_000, 10, "640x360"),
            ],
        }
    }
}
