use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub github: GithubConfig,
  pub paging: PagingSettings,
  pub cache: CacheConfig,
  pub log: LogConfig,
  /// Query to search for when none is given on the command line
  pub default_query: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
  /// Base URL of the REST API (GitHub Enterprise uses https://host/api/v3)
  pub api_url: String,
}

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      api_url: "https://api.github.com".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagingSettings {
  /// Items requested per remote page and read per local page
  pub page_size: u32,
  /// How close to a window edge the selection may get before loading more
  pub prefetch_distance: u32,
  /// Maximum number of items held in the window
  pub max_size: u32,
}

impl Default for PagingSettings {
  fn default() -> Self {
    Self {
      page_size: 30,
      prefetch_distance: 10,
      max_size: 300,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Database file (default: $XDG_DATA_HOME/ghscroll/cache.db)
  pub path: Option<PathBuf>,
  /// Cached results younger than this are shown on startup without a refresh
  pub timeout_minutes: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: None,
      timeout_minutes: 60,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// tracing filter directive, overridden by GHSCROLL_LOG
  pub filter: String,
  /// Directory for ghscroll.log (default: the data directory)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      filter: "ghscroll=info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./ghscroll.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ghscroll/config.yaml
  ///
  /// Falls back to defaults when no file is found.
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
      None => Self::default(),
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("ghscroll.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ghscroll").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.paging.page_size == 0 || self.paging.page_size > 100 {
      return Err(eyre!(
        "paging.page_size must be between 1 and 100, got {}",
        self.paging.page_size
      ));
    }
    if self.paging.max_size < self.paging.page_size * 2 {
      return Err(eyre!(
        "paging.max_size ({}) must hold at least two pages of {}",
        self.paging.max_size,
        self.paging.page_size
      ));
    }
    url::Url::parse(&self.github.api_url)
      .map_err(|e| eyre!("Invalid github.api_url {}: {}", self.github.api_url, e))?;
    Ok(())
  }

  /// Get the GitHub API token from environment variables, if any.
  ///
  /// Checks GHSCROLL_GITHUB_TOKEN first, then GITHUB_TOKEN as fallback.
  /// Unauthenticated search works, with a lower rate limit.
  pub fn get_api_token() -> Option<String> {
    std::env::var("GHSCROLL_GITHUB_TOKEN")
      .or_else(|_| std::env::var("GITHUB_TOKEN"))
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
