//! Engine configuration.
//!
//! Tunables shared by every client that embeds the sync engine. Clients load
//! this from their own config file; missing fields take the defaults below.

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

/// Quiet period before a burst of edits is captured as a version.
pub const DEFAULT_SNAPSHOT_QUIET_MS: i64 = 3_000;
/// Number of versions retained per note.
pub const DEFAULT_MAX_VERSIONS: usize = 20;
/// Origin used to build share links.
pub const DEFAULT_SHARE_ORIGIN: &str = "https://inkpad.app";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub snapshot_quiet_ms: i64,
    pub max_versions: usize,
    pub share_origin: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_quiet_ms: DEFAULT_SNAPSHOT_QUIET_MS,
            max_versions: DEFAULT_MAX_VERSIONS,
            share_origin: DEFAULT_SHARE_ORIGIN.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config payload and validate it.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.validated()
    }

    /// Reject values the engine cannot run with and normalize the origin.
    pub fn validated(mut self) -> Result<Self> {
        if self.snapshot_quiet_ms < 0 {
            return Err(Error::InvalidInput(
                "snapshot_quiet_ms must not be negative".to_string(),
            ));
        }
        if self.max_versions == 0 {
            return Err(Error::InvalidInput(
                "max_versions must be at least 1".to_string(),
            ));
        }

        let origin = normalize_text_option(Some(self.share_origin))
            .ok_or_else(|| Error::InvalidInput("share_origin is required".to_string()))?;
        if !is_http_url(&origin) {
            return Err(Error::InvalidInput(
                "share_origin must include http:// or https://".to_string(),
            ));
        }
        self.share_origin = origin.trim_end_matches('/').to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.snapshot_quiet_ms, 3_000);
        assert_eq!(config.max_versions, 20);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(EngineConfig::from_json(r#"{"quiet": 10}"#).is_err());
    }

    #[test]
    fn share_origin_is_normalized() {
        let config =
            EngineConfig::from_json(r#"{"share_origin": "  https://notes.example.com/ "}"#)
                .unwrap();
        assert_eq!(config.share_origin, "https://notes.example.com");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EngineConfig::from_json(r#"{"max_versions": 0}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"snapshot_quiet_ms": -1}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"share_origin": "inkpad.app"}"#).is_err());
    }
}
