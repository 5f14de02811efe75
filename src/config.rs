use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::QueueSettings;
use crate::storage::DEFAULT_QUOTA_BYTES;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub storage: StorageConfig,
  pub backend: BackendConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Lifetime of cached responses and of the stored entity snapshot
  pub cache_ttl_minutes: u64,
  pub request_delay_ms: u64,
  pub timeout_secs: u64,
  /// Entities kept per list fetch
  pub preview_limit: usize,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://www.swapi.tech/api".to_string(),
      cache_ttl_minutes: 30,
      request_delay_ms: 10,
      timeout_secs: 10,
      preview_limit: 6,
    }
  }
}

impl ApiConfig {
  pub fn queue_settings(&self) -> Result<QueueSettings> {
    Ok(QueueSettings {
      ttl: self.freshness()?,
      delay: Duration::from_millis(self.request_delay_ms),
      timeout: Duration::from_secs(self.timeout_secs),
    })
  }

  /// `cache_ttl_minutes` as a duration; out-of-range values are a config
  /// error rather than a panic.
  pub fn freshness(&self) -> Result<chrono::TimeDelta> {
    i64::try_from(self.cache_ttl_minutes)
      .ok()
      .and_then(chrono::TimeDelta::try_minutes)
      .ok_or_else(|| eyre!("api.cache_ttl_minutes is too large: {}", self.cache_ttl_minutes))
  }

  /// Host shown in the header when no title is configured
  pub fn host(&self) -> &str {
    self
      .base_url
      .split("://")
      .nth(1)
      .and_then(|rest| rest.split('/').next())
      .unwrap_or(&self.base_url)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// SQLite file (default: $XDG_DATA_HOME/holocron/storage.db)
  pub path: Option<PathBuf>,
  pub quota_bytes: usize,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      path: None,
      quota_bytes: DEFAULT_QUOTA_BYTES,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
  pub url: String,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:3001".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./holocron.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/holocron/config.yaml
  ///
  /// Without a file the defaults apply; the content API needs no credentials.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => {
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("holocron.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("holocron").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is valid and means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  pub fn title(&self) -> String {
    self
      .title
      .clone()
      .unwrap_or_else(|| self.api.host().to_string())
  }

  /// Backend bearer token from HOLOCRON_BACKEND_TOKEN, if set.
  pub fn backend_token() -> Option<String> {
    std::env::var("HOLOCRON_BACKEND_TOKEN")
      .ok()
      .filter(|t| !t.is_empty())
  }

  /// Backend password from HOLOCRON_BACKEND_PASSWORD.
  pub fn backend_password() -> Result<String> {
    std::env::var("HOLOCRON_BACKEND_PASSWORD").map_err(|_| {
      eyre!("Backend password not found. Set the HOLOCRON_BACKEND_PASSWORD environment variable.")
    })
  }

  /// Replacement password for `change-password`, from HOLOCRON_BACKEND_NEW_PASSWORD.
  pub fn backend_new_password() -> Result<String> {
    std::env::var("HOLOCRON_BACKEND_NEW_PASSWORD").map_err(|_| {
      eyre!("New password not found. Set the HOLOCRON_BACKEND_NEW_PASSWORD environment variable.")
    })
  }
}
