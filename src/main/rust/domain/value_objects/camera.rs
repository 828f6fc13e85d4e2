use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Camera descriptor handed over by discovery or manual registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(rename = "type", default = "default_camera_type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_camera_type() -> String {
    "manual".to_string()
}

impl Camera {
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            source_url: source_url.into(),
            credentials: None,
            kind: default_camera_type(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidSourceUrl(format!(
                "camera id is required (source {})",
                self.source_url
            )));
        }
        if !self.source_url.contains("://") {
            return Err(DomainError::InvalidSourceUrl(self.source_url.clone()));
        }
        Ok(())
    }

    /// Source URL with credentials spliced into the authority.
    ///
    /// Credentials are only applied when both parts are present; the URL is
    /// otherwise treated as an opaque string.
    pub fn input_url(&self) -> String {
        let Some(credentials) = &self.credentials else {
            return self.source_url.clone();
        };
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return self.source_url.clone();
        }

        match self.source_url.split_once("://") {
            Some((scheme, rest)) => format!(
                "{}://{}:{}@{}",
                scheme, credentials.username, credentials.password, rest
            ),
            None => self.source_url.clone(),
        }
    }
}
