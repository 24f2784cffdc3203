//! Configuration for the ledger session

use serde::{Deserialize, Serialize};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Ledger actor configuration
    pub actor: ActorConfig,

    /// Time input configuration
    pub input: InputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "sleep-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            actor: ActorConfig::default(),
            input: InputConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Ledger actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Mailbox capacity (edits queued before callers wait)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
        }
    }
}

/// Time input configuration
///
/// Applies to the session's input handling only. The ledger accepts any
/// time of day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Minute granularity of accepted times
    pub minute_step: u32,

    /// Render times as 24-hour `HH:MM`
    pub use_24_hour_clock: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            minute_step: 5,
            use_24_hour_clock: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub default_directive: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_directive: "sleep_ledger=info".to_string(),
            json: false,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Collect Prometheus metrics
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(directive) = std::env::var("AHI_LOG") {
            config.logging.default_directive = directive;
        }

        if let Ok(json) = std::env::var("AHI_LOG_JSON") {
            config.logging.json = parse_flag("AHI_LOG_JSON", &json)?;
        }

        if let Ok(step) = std::env::var("AHI_MINUTE_STEP") {
            config.input.minute_step = step.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid AHI_MINUTE_STEP '{}': {}", step, e))
            })?;
        }

        if let Ok(capacity) = std::env::var("AHI_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid AHI_MAILBOX_CAPACITY '{}': {}", capacity, e))
            })?;
        }

        if let Ok(enabled) = std::env::var("AHI_METRICS_ENABLED") {
            config.metrics.enabled = parse_flag("AHI_METRICS_ENABLED", &enabled)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }
        let step = self.input.minute_step;
        if step == 0 || step > 60 || 60 % step != 0 {
            return Err(crate::Error::Config(format!(
                "input.minute_step must divide 60, got {}",
                step
            )));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> crate::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(crate::Error::Config(format!(
            "Invalid {} '{}': expected true/false",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "sleep-ledger");
        assert_eq!(config.input.minute_step, 5);
        assert!(config.input.use_24_hour_clock);
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[input]\nminute_step = 15\n\n[metrics]\nenabled = false").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.input.minute_step, 15);
        assert!(config.input.use_24_hour_clock);
        assert!(!config.metrics.enabled);
        assert_eq!(config.actor.mailbox_capacity, 64);
    }

    #[test]
    fn test_from_file_rejects_bad_step() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[input]\nminute_step = 7").unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
