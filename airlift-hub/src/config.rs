//! Configuration system for the Airlift hub.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/airlift-hub/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur when loading hub configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the hub.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct HubConfigFile {
    server: ServerFileConfig,
    probe: ProbeFileConfig,
    tokens: Vec<TokenEntry>,
}

/// `[server]` section of the hub config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    max_file_size: Option<u64>,
    max_chunk_size: Option<usize>,
}

/// `[probe]` section of the hub config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ProbeFileConfig {
    port: Option<u16>,
    timeout_secs: Option<u64>,
    poll_secs: Option<u64>,
}

/// One `[[tokens]]` entry mapping an admission token to a user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct TokenEntry {
    /// The admission token presented on connect.
    pub token: String,
    /// Stable user id the token resolves to.
    pub user_id: String,
    /// Display name shown to other users.
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the hub.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Airlift signaling hub")]
pub struct HubCliArgs {
    /// Address to bind the hub to.
    #[arg(short, long, env = "AIRLIFT_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/airlift-hub/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum declared file size accepted in offers, in bytes.
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Maximum chunk payload size in bytes.
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// TCP port probed on each user's address for peer-service reachability.
    #[arg(long)]
    pub probe_port: Option<u16>,

    /// Per-probe connect timeout in seconds.
    #[arg(long)]
    pub probe_timeout: Option<u64>,

    /// Seconds between reachability polling sweeps.
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "AIRLIFT_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:9000`).
    pub bind_addr: String,
    /// Maximum declared file size accepted in offers, in bytes.
    pub max_file_size: u64,
    /// Maximum chunk payload size in bytes.
    pub max_chunk_size: usize,
    /// TCP port probed for peer-service reachability.
    pub probe_port: u16,
    /// Per-probe connect timeout.
    pub probe_timeout: Duration,
    /// Interval between reachability polling sweeps.
    pub poll_interval: Duration,
    /// Admission tokens for the static resolver.
    pub tokens: Vec<TokenEntry>,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9000".to_string(),
            max_file_size: 100 * 1024 * 1024 * 1024,
            max_chunk_size: 1024 * 1024,
            probe_port: 6112,
            probe_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_secs(15),
            tokens: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl HubConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and a missing
    /// file is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &HubCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, file))
    }

    /// Resolve a `HubConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &HubCliArgs, file: HubConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            max_file_size: cli
                .max_file_size
                .or(file.server.max_file_size)
                .unwrap_or(defaults.max_file_size),
            max_chunk_size: cli
                .max_chunk_size
                .or(file.server.max_chunk_size)
                .unwrap_or(defaults.max_chunk_size),
            probe_port: cli
                .probe_port
                .or(file.probe.port)
                .unwrap_or(defaults.probe_port),
            probe_timeout: cli
                .probe_timeout
                .or(file.probe.timeout_secs)
                .map_or(defaults.probe_timeout, Duration::from_secs),
            poll_interval: cli
                .poll_interval
                .or(file.probe.poll_secs)
                .map_or(defaults.poll_interval, Duration::from_secs),
            tokens: file.tokens,
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the hub.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<HubConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(HubConfigFile::default());
        };
        config_dir.join("airlift-hub").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HubConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
