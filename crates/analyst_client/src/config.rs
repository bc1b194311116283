//! Client config load/save for `~/.auto-analyst/config.yaml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backend address used when the config does not name one.
pub const DEFAULT_BASE_URL: &str = "http://52.62.18.64:5000";

/// Env var that overrides the config path.
pub const CONFIG_ENV: &str = "ANALYST_CONFIG";

/// Backend section (base_url, timeout_secs).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BackendSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Whole-request timeout. Unset means the transport default (none).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Log section. `filter` is an `EnvFilter` directive such as `info` or
/// `analyst_client=debug`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LogSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub log: LogSection,
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.backend
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.backend.timeout_secs.map(Duration::from_secs)
    }
}

/// Returns the default config file path: `~/.auto-analyst/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".auto-analyst").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load the config at `path`, falling back to defaults when the file does not
/// exist. Used for the default location, where no file is the common case.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    match load(path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
        other => other,
    }
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io_err = |e: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents).map_err(io_err)
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
