use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Room name used as the routing key for the media, signaling and chat services
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// Parse user input: surrounding whitespace is dropped, empty names are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidInput(
                "Room name is required".to_string(),
            ));
        }
        if trimmed.contains('/') {
            return Err(ClientError::InvalidInput(
                "Room name must not contain '/'".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Fresh name for a new meeting
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
