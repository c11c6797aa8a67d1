//! Engine settings.
//!
//! Tunables for the pipeline engine, loadable from a TOML block so
//! embedders can ship them alongside the rest of their configuration.
//! Every field has a default; an empty document is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading engine settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to parse the TOML document.
    #[error("Failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunable parameters for the pipeline engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum concurrent detail-generation requests.
    pub detail_fan_out: usize,

    /// Caller-side timeout for each generation service response, in
    /// seconds.
    pub unit_timeout_secs: u64,

    /// Suggested capacity for the engine's event channel.
    pub event_buffer: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            detail_fan_out: 3,
            unit_timeout_secs: 30,
            event_buffer: 100,
        }
    }
}

impl EngineSettings {
    /// Parse settings from a TOML string, falling back to defaults for
    /// absent fields.
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(input)?)
    }

    /// The per-response timeout as a [`Duration`].
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.detail_fan_out, 3);
        assert_eq!(settings.unit_timeout_secs, 30);
        assert_eq!(settings.event_buffer, 100);
        assert_eq!(settings.unit_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = EngineSettings::from_toml_str("").unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_partial_document_overrides_some_fields() {
        let settings = EngineSettings::from_toml_str(
            r#"
detail_fan_out = 8
unit_timeout_secs = 5
"#,
        )
        .unwrap();

        assert_eq!(settings.detail_fan_out, 8);
        assert_eq!(settings.unit_timeout_secs, 5);
        assert_eq!(settings.event_buffer, 100);
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let result = EngineSettings::from_toml_str("detail_fan_out = \"many\"");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }
}
