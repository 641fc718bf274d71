//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/savvylinks/config.toml)
//! 3. Environment variables (SAVVYLINKS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "SAVVYLINKS";

/// Default SavvyCal API endpoint
pub const DEFAULT_API_URL: &str = "https://api.savvycal.com";

/// Default base for public booking links
pub const DEFAULT_LINK_BASE_URL: &str = "https://savvycal.com";

/// Default refresh interval (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SavvyCal personal access token
    #[serde(default)]
    pub token: Option<String>,

    /// API base URL (without the /v1 suffix)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL used to build public booking links
    #[serde(default = "default_link_base_url")]
    pub link_base_url: String,

    /// Seconds between scheduled refreshes
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum fuzzy score a search must reach to match
    #[serde(default)]
    pub min_match_score: i64,

    /// Log file path (stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            link_base_url: default_link_base_url(),
            refresh_interval_secs: default_refresh_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            min_match_score: 0,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SAVVYLINKS_TOKEN, SAVVYLINKS_API_URL, ...)
    /// 2. Config file (~/.config/savvylinks/config.toml or SAVVYLINKS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path from the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // SAVVYLINKS_TOKEN
        if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
            self.token = if val.is_empty() { None } else { Some(val) };
        }

        // SAVVYLINKS_API_URL
        if let Ok(val) = std::env::var(format!("{}_API_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.api_url = val;
            }
        }

        // SAVVYLINKS_LINK_BASE_URL
        if let Ok(val) = std::env::var(format!("{}_LINK_BASE_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.link_base_url = val;
            }
        }

        // SAVVYLINKS_REFRESH_INTERVAL
        if let Ok(val) = std::env::var(format!("{}_REFRESH_INTERVAL", ENV_PREFIX)) {
            if let Ok(secs) = val.parse::<u64>() {
                self.refresh_interval_secs = secs;
            }
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SAVVYLINKS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("savvylinks")
            .join("config.toml")
    }

    /// Interval between scheduled refreshes
    ///
    /// Zero is clamped to one second so the timer never spins.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Timeout applied to every API request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// The configured token, or an empty string when unset
    pub fn token_or_empty(&self) -> &str {
        self.token.as_deref().unwrap_or("")
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_link_base_url() -> String {
    DEFAULT_LINK_BASE_URL.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "SAVVYLINKS_TOKEN",
        "SAVVYLINKS_API_URL",
        "SAVVYLINKS_LINK_BASE_URL",
        "SAVVYLINKS_REFRESH_INTERVAL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.token.is_none());
        assert_eq!(config.api_url, "https://api.savvycal.com");
        assert_eq!(config.link_base_url, "https://savvycal.com");
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
        assert_eq!(config.token_or_empty(), "");
    }

    #[test]
    fn test_refresh_interval_never_zero() {
        let config = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_env_override_token() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("SAVVYLINKS_TOKEN", "secret");
        config.apply_env_overrides();
        assert_eq!(config.token.as_deref(), Some("secret"));

        // Empty string clears it
        env::set_var("SAVVYLINKS_TOKEN", "");
        config.apply_env_overrides();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_override_urls_and_interval() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("SAVVYLINKS_API_URL", "http://localhost:9000");
        env::set_var("SAVVYLINKS_LINK_BASE_URL", "http://links.local");
        env::set_var("SAVVYLINKS_REFRESH_INTERVAL", "60");
        config.apply_env_overrides();

        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.link_base_url, "http://links.local");
        assert_eq!(config.refresh_interval_secs, 60);

        // Garbage interval is ignored
        env::set_var("SAVVYLINKS_REFRESH_INTERVAL", "soon");
        config.apply_env_overrides();
        assert_eq!(config.refresh_interval_secs, 60);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            token = "abc"
            refresh_interval_secs = 120
            min_match_score = 10
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.refresh_interval_secs, 120);
        assert_eq!(config.min_match_score, 10);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            token: Some("tok".to_string()),
            refresh_interval_secs: 42,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.token.as_deref(), Some("tok"));
        assert_eq!(loaded.refresh_interval_secs, 42);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.token.is_none());
        assert_eq!(config.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
    }
}
