use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "STOREDESK_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Backend base URL (e.g., "https://api.example.com/v1/")
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Header carrying the session token on authenticated requests
  #[serde(default = "default_auth_header")]
  pub auth_header: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      auth_header: default_auth_header(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

fn default_base_url() -> String {
  "http://localhost:3000/".to_string()
}

fn default_auth_header() -> String {
  "x-access-token".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// How long query results count as fresh. Zero refetches on every read
  /// that is not already in flight.
  #[serde(default)]
  pub stale_secs: u64,
}

impl CacheConfig {
  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_secs)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
  /// Session database path (default: $XDG_DATA_HOME/storedesk/session.db)
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./storedesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/storedesk/config.yaml
  ///
  /// Without a file the defaults are used. `STOREDESK_API_URL` overrides
  /// the base URL in every case.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_env_overrides(std::env::var(API_URL_ENV).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("storedesk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("storedesk").join("config.yaml");
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
    // An empty file parses as YAML null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn with_env_overrides(mut self, api_url: Option<String>) -> Self {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
      self.api.base_url = url;
    }
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_partial_config_fills_defaults() {
    let config = Config::parse(
      r#"
api:
  base_url: https://api.shop.test/v1/
cache:
  stale_secs: 30
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://api.shop.test/v1/");
    assert_eq!(config.api.auth_header, "x-access-token");
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.cache.stale_time(), Duration::from_secs(30));
    assert!(config.session.path.is_none());
  }

  #[test]
  fn test_empty_config_is_default() {
    let config = Config::parse("  \n").unwrap();
    assert_eq!(config.api.base_url, "http://localhost:3000/");
    assert_eq!(config.cache.stale_time(), Duration::ZERO);
  }

  #[test]
  fn test_env_override_wins() {
    let config = Config::default().with_env_overrides(Some("https://override.test/".to_string()));
    assert_eq!(config.api.base_url, "https://override.test/");

    let config = Config::default().with_env_overrides(Some(" ".to_string()));
    assert_eq!(config.api.base_url, "http://localhost:3000/");
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/storedesk.yaml"))).is_err());
  }
}
