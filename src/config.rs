use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::event::Filter;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/events";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    pub endpoint: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UiConfig {
    #[serde(default)]
    pub initial_filter: Filter,
    #[serde(default = "default_true")]
    pub show_branch_transition: bool,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            initial_filter: Filter::All,
            show_branch_transition: true,
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "eventwatch")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("eventwatch.toml"))
}

pub fn get_default_log_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "eventwatch")
        .context("Failed to determine project directories")?;

    Ok(proj_dirs.data_local_dir().join("eventwatch.log"))
}

/// Where logs go. `None` means stderr, which is only safe with `--once`
/// since the dashboard owns the terminal.
pub fn resolve_log_path(cli_args: &CliArgs) -> Result<Option<PathBuf>> {
    match (&cli_args.log_file, cli_args.once) {
        (Some(path), _) => Ok(Some(path.clone())),
        (None, true) => Ok(None),
        (None, false) => get_default_log_path().map(Some),
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: CliArgs, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        // CLI args override config file
        if let Some(endpoint) = cli_args.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(filter) = cli_args.filter {
            config.ui.initial_filter = filter;
        }
        if let Some(interval) = cli_args.interval {
            config.poll_interval_secs = interval;
        }

        Ok(config)
    }

    /// Poll period, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
