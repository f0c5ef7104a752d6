use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::{DEFAULT_CACHE_LIFETIME, DEFAULT_METHOD};
use crate::logging::Severity;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub client: ClientConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Write logs to this file instead of stderr
  pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the JSON:API endpoint
  #[serde(default)]
  pub endpoint: String,
  /// Bearer token; falls back to the environment when unset
  pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
  /// Level failures are logged at
  #[serde(default)]
  pub error_level: Severity,
  /// Seconds to cache results when the response has no max-age
  #[serde(default = "default_cache_lifetime")]
  pub cache_lifetime: u64,
  #[serde(default = "default_method")]
  pub method: String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      error_level: Severity::default(),
      cache_lifetime: DEFAULT_CACHE_LIFETIME,
      method: DEFAULT_METHOD.to_string(),
    }
  }
}

fn default_cache_lifetime() -> u64 {
  DEFAULT_CACHE_LIFETIME
}

fn default_method() -> String {
  DEFAULT_METHOD.to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// SQLite database on disk
  #[default]
  Sqlite,
  /// Process memory (only useful within a single run)
  Memory,
  /// No caching
  #[serde(rename = "none")]
  #[value(name = "none")]
  Disabled,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub backend: CacheBackend,
  /// Database location for the sqlite backend
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jsonapi-cache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jsonapi-cache/config.yaml
  ///
  /// Returns `Ok(None)` when no file is found and none was asked for.
  pub fn load(explicit_path: Option<&Path>) -> Result<Option<Self>> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    path.map(|p| Self::load_from_path(&p)).transpose()
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("jsonapi-cache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jsonapi-cache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Token from the config file, else from the environment.
  pub fn token(&self) -> Option<String> {
    self
      .api
      .token
      .clone()
      .filter(|t| !t.is_empty())
      .or_else(Self::get_api_token)
  }

  /// Get the API token from environment variables.
  ///
  /// Checks JSONAPI_CACHE_TOKEN first, then JSONAPI_TOKEN as fallback.
  pub fn get_api_token() -> Option<String> {
    std::env::var("JSONAPI_CACHE_TOKEN")
      .or_else(|_| std::env::var("JSONAPI_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }
}
