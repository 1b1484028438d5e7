use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
///
/// Loaded from the config file, then overridden by CLI flags and env vars.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there is no file
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// `<config dir>/easytoget/config.toml` (XDG on Linux, AppData on Windows)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("easytoget");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the TUI writes its log file
    pub fn log_dir() -> crate::Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join("easytoget"))
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host the content API runs on; the port is appended
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Full base URL, wins over host/port/scheme when set
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Page size to ask for; the server picks when unset
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ApiConfig {
    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    easytoget_api::DEFAULT_API_PORT
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            scheme: default_scheme(),
            base_url: None,
            timeout_secs: default_timeout(),
            per_page: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// How long toasts stay up; 0 keeps them until dismissed
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,
}

impl NotificationConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

fn default_duration_ms() -> u64 {
    crate::notify::DEFAULT_NOTIFICATION_DURATION.as_millis() as u64
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedConfig {
    /// Keep the previous results on screen when a fetch fails
    #[serde(default)]
    pub keep_results_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub mouse_enabled: bool,

    #[serde(default)]
    pub show_help_on_start: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.resolved_base_url(), "http://localhost:5001");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.notifications.default_duration_ms, 5000);
        assert!(!config.feed.keep_results_on_error);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("port = 5001"));
        assert!(toml.contains("default_duration_ms"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [api]
            host = "192.168.0.12"

            [feed]
            keep_results_on_error = true
            "#,
        )
        .unwrap();

        assert_eq!(config.api.resolved_base_url(), "http://192.168.0.12:5001");
        assert!(config.feed.keep_results_on_error);
        assert_eq!(config.notifications.default_duration_ms, 5000);
    }

    #[test]
    fn test_base_url_override_wins() {
        let mut config = ApiConfig::default();
        config.base_url = Some("https://api.easytoget.example/ ".into());
        assert_eq!(config.resolved_base_url(), "https://api.easytoget.example");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("api = [").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }
}
