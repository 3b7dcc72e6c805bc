//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Gamma exponent applied to difference frames when no overlay is drawn.
pub const DEFAULT_GAMMA: f64 = 1.0 / 1.1;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default extraction settings.
    pub extraction: ExtractionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default extraction parameters. Command-line flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionDefaults {
    /// Tone curve exponent for difference frames.
    pub gamma: f64,

    /// Output video codec (e.g. "h264", "h265", "vp9").
    pub codec: String,

    /// Whether to overlay the motion mask on the source by default.
    pub overlay: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "motionx=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            codec: "h264".to_string(),
            overlay: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse a config document. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("motionx").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_tool() {
        let config = AppConfig::default();
        assert!((config.extraction.gamma - 1.0 / 1.1).abs() < 1e-12);
        assert_eq!(config.extraction.codec, "h264");
        assert!(!config.extraction.overlay);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = AppConfig::from_json(r#"{ "extraction": { "overlay": true } }"#).unwrap();
        assert!(config.extraction.overlay);
        assert_eq!(config.extraction.codec, "h264");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = AppConfig::default();
        config.extraction.codec = "vp9".to_string();
        config.logging.json = true;
        let json = serde_json::to_string(&config).unwrap();
        let parsed = AppConfig::from_json(&json).unwrap();
        assert_eq!(parsed.extraction.codec, "vp9");
        assert!(parsed.logging.json);
    }
}
