use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::attach::AttachStrategy;
use crate::executor::AttachMethod;

/// Overrides the configured global attach strategy
pub const STRATEGY_ENV: &str = "TMUX_FLEET_ATTACH_STRATEGY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid host '{0}'")]
    InvalidHost(String),

    #[error("invalid environment override: {0}")]
    InvalidEnv(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global default attach strategy
    pub attach_strategy: Option<AttachStrategy>,
    pub hosts: Vec<HostConfig>,
}

/// One remote host
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub host: String,
    /// `0` means 22
    #[serde(default)]
    pub port: u16,
    #[serde(default, deserialize_with = "method_from_str")]
    pub method: AttachMethod,
    /// Display label; defaults to `host`
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub attach_strategy: Option<AttachStrategy>,
}

fn method_from_str<'de, D>(deserializer: D) -> Result<AttachMethod, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl HostConfig {
    /// Parse a `--host` flag value: `[user@]host[:port]`
    pub fn from_flag(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let (host, port) = match raw.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                let port = port
                    .parse()
                    .map_err(|_| ConfigError::InvalidHost(raw.to_string()))?;
                (host, port)
            }
            _ => (raw, 0),
        };
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidHost(raw.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            method: AttachMethod::Ssh,
            alias: String::new(),
            attach_strategy: None,
        })
    }
}

/// Default location: `$XDG_CONFIG_HOME/tmux-fleet/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tmux-fleet").join("config.toml"))
}

/// Load configuration from `path`, or from the default location if it exists.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config(&path)?,
            _ => Config::default(),
        },
    };
    apply_env(&mut config, std::env::var(STRATEGY_ENV).ok().as_deref())?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

fn apply_env(config: &mut Config, strategy: Option<&str>) -> Result<(), ConfigError> {
    if let Some(raw) = strategy.filter(|s| !s.trim().is_empty()) {
        let strategy: AttachStrategy = raw
            .parse()
            .map_err(|e| ConfigError::InvalidEnv(format!("{STRATEGY_ENV}: {e}")))?;
        config.attach_strategy = Some(strategy);
    }
    Ok(())
}
