//! Configuration vault – reads/writes `~/.posecast/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use posecast_runtime::{DEFAULT_HOST, DEFAULT_PORT, PipelineConfig};
use posecast_types::EndpointConfig;

/// Persisted user configuration stored in `~/.posecast/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address of the machine receiving the pose stream.
    #[serde(default = "default_host")]
    pub host: String,

    /// UDP port the receiver listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Sensor sampling rate; one datagram is sent per sample.
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,

    /// Local UDP port used by `posecast listen`.
    #[serde(default = "default_port")]
    pub listen_port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_sample_rate_hz() -> f64 {
    60.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            sample_rate_hz: default_sample_rate_hz(),
            listen_port: default_port(),
        }
    }
}

impl Config {
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(self.host.clone(), self.port)
    }

    /// Validate and convert into the pipeline's fixed settings.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.port == 0 {
            return Err("port must be between 1 and 65535".to_string());
        }
        PipelineConfig::from_rate_hz(self.endpoint(), self.sample_rate_hz).map_err(|e| e.to_string())
    }
}

/// Return the path to `~/.posecast/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".posecast").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `POSECAST_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `POSECAST_HOST` | `host` |
/// | `POSECAST_PORT` | `port` |
/// | `POSECAST_SAMPLE_RATE_HZ` | `sample_rate_hz` |
/// | `POSECAST_LISTEN_PORT` | `listen_port` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("POSECAST_HOST") {
        cfg.host = v;
    }
    if let Ok(v) = std::env::var("POSECAST_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.port = port;
    }
    if let Ok(v) = std::env::var("POSECAST_SAMPLE_RATE_HZ")
        && let Ok(rate) = v.parse::<f64>()
    {
        cfg.sample_rate_hz = rate;
    }
    if let Ok(v) = std::env::var("POSECAST_LISTEN_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.listen_port = port;
    }
}

/// Save the config to disk, creating `~/.posecast/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
