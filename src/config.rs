//! Logger configuration and its environment overrides.
use crate::buffer::DEFAULT_BACKUP_CAPACITY;
use crate::error::ConfigError;
use crate::fallback::Fallback;
use crate::server::DEFAULT_KEEPALIVE_INTERVAL;
use std::time::Duration;

/// Port the viewer listens on when none is given.
pub const DEFAULT_PORT: u16 = 19867;
/// Minimum time between two recovery attempts.
pub const DEFAULT_RECOVERY_COOLDOWN: Duration = Duration::from_secs(60);

pub const PORT_ENV: &str = "WEBVIEW_LOGGER_PORT";
pub const AUTO_RECOVER_ENV: &str = "WEBVIEW_LOGGER_AUTO_RECOVER";
pub const FALLBACK_ENV: &str = "WEBVIEW_LOGGER_FALLBACK";

/// Settings for a [`Logger`](crate::Logger).
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    /// Port of the viewer. Port 0 picks a free port at start.
    pub port: u16,
    /// Whether failed delivery triggers recovery attempts.
    pub auto_recover: bool,
    /// Records kept while the viewer is unavailable.
    pub backup_capacity: usize,
    /// Minimum time between two recovery attempts.
    pub recovery_cooldown: Duration,
    /// Idle time before a live stream receives a keepalive event.
    pub keepalive_interval: Duration,
    /// Where the local copy of each record goes.
    pub fallback: Fallback,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auto_recover: true,
            backup_capacity: DEFAULT_BACKUP_CAPACITY,
            recovery_cooldown: DEFAULT_RECOVERY_COOLDOWN,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            fallback: Fallback::default(),
        }
    }
}

impl LoggerConfig {
    /// The default configuration with overrides taken from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but with a custom variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(PORT_ENV) {
            config.port = value.trim().parse().map_err(|_| ConfigError::InvalidPort {
                name: PORT_ENV,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(AUTO_RECOVER_ENV) {
            config.auto_recover = parse_flag(AUTO_RECOVER_ENV, &value)?;
        }

        if let Some(value) = lookup(FALLBACK_ENV) {
            config.fallback = value.parse().map_err(|_| ConfigError::InvalidFallback {
                name: FALLBACK_ENV,
                value: value.clone(),
            })?;
        }

        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
