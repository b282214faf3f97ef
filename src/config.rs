use derive_more::{Display, Error, From};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "Config.toml";

#[derive(Debug, Display, Error, From)]
pub enum ConfigError {
    #[display(fmt = "failed to read configuration: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "failed to parse configuration: {}", _0)]
    Toml(toml::de::Error),
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub clock: ClockConfig,
    pub codes: CodeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    /// Wall-clock milliseconds per clock unit.
    pub tick_millis: u64,
    pub default_time_control_seconds: u32,
    pub max_time_control_seconds: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CodeConfig {
    pub length: usize,
    pub max_attempts: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl AppConfig {
    /// Reads `path` when it exists, otherwise starts from defaults; `CHESSMATE_*` variables
    /// override either.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            warn!(path = %path.display(), "configuration file not found, using defaults");
            Self::default()
        };

        config.merge_env();
        Ok(config)
    }

    /// Logs the effective configuration.
    pub fn log(&self) {
        info!(
            host = %self.server.host,
            port = self.server.port,
            tick_millis = self.clock.tick_millis,
            default_time_control = self.clock.default_time_control_seconds,
            max_time_control = self.clock.max_time_control_seconds,
            code_length = self.codes.length,
            code_attempts = self.codes.max_attempts,
            "chessmate configuration"
        );
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("CHESSMATE_SERVER_HOST") {
            if !val.trim().is_empty() {
                self.server.host = val;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_SERVER_PORT") {
            if let Ok(parsed) = val.parse() {
                self.server.port = parsed;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_CLOCK_TICK_MILLIS") {
            if let Ok(parsed) = val.parse() {
                self.clock.tick_millis = parsed;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_CLOCK_DEFAULT_TIME_CONTROL") {
            if let Ok(parsed) = val.parse() {
                self.clock.default_time_control_seconds = parsed;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_CLOCK_MAX_TIME_CONTROL") {
            if let Ok(parsed) = val.parse() {
                self.clock.max_time_control_seconds = parsed;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_CODES_LENGTH") {
            if let Ok(parsed) = val.parse() {
                self.codes.length = parsed;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_CODES_MAX_ATTEMPTS") {
            if let Ok(parsed) = val.parse() {
                self.codes.max_attempts = parsed;
            }
        }
        if let Ok(val) = std::env::var("CHESSMATE_LOG_FILTER") {
            if !val.trim().is_empty() {
                self.logging.filter = val;
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}
impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_millis: 1000,
            default_time_control_seconds: 300,
            max_time_control_seconds: 3 * 60 * 60,
        }
    }
}
impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            max_attempts: 32,
        }
    }
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
