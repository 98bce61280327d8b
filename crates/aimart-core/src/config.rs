//! Configuration management for the aimart client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// List page behaviour
    #[serde(default)]
    pub list: ListConfig,

    /// Notification configuration
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the marketplace API, without the `/v1` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Client-side request timeout in seconds (0 disables it)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// List page configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListConfig {
    /// Page size used when a page first opens
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Page sizes the user may pick from
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<u32>,

    /// Quiet period before a typed search term is applied
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,

    /// Records requested per list fetch; paging happens client-side
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// Most server pages pulled for one collection
    #[serde(default = "default_max_fetch_pages")]
    pub max_fetch_pages: u32,
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Time a notification stays visible
    #[serde(default = "default_notification_ttl")]
    pub ttl_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    20
}

fn default_page_size_options() -> Vec<u32> {
    vec![10, 20, 50, 100]
}

const fn default_search_debounce() -> u64 {
    300
}

const fn default_fetch_limit() -> u32 {
    1000
}

const fn default_max_fetch_pages() -> u32 {
    10
}

const fn default_notification_ttl() -> u64 {
    4500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            page_size_options: default_page_size_options(),
            search_debounce_ms: default_search_debounce(),
            fetch_limit: default_fetch_limit(),
            max_fetch_pages: default_max_fetch_pages(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_notification_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    /// Request timeout, `None` when disabled
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }
}

impl ListConfig {
    /// Search debounce as a `Duration`
    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl NotificationConfig {
    /// Notification lifetime as a `Duration`
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Config {
    /// Load configuration from `aimart.toml` (optional) and `AIMART_*`
    /// environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over `aimart.toml`
    ///
    /// Environment variables use a double underscore between section and
    /// key, e.g. `AIMART_API__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing, any source fails to
    /// parse, or the result does not validate.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("aimart").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("AIMART")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` describing the first violated rule.
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::Error::configuration("api.base_url must not be empty"));
        }
        if self.list.fetch_limit == 0 {
            return Err(crate::Error::configuration("list.fetch_limit must not be 0"));
        }
        if self.list.max_fetch_pages == 0 {
            return Err(crate::Error::configuration(
                "list.max_fetch_pages must not be 0",
            ));
        }
        if self.list.page_size_options.contains(&0) {
            return Err(crate::Error::configuration(
                "list.page_size_options must not contain 0",
            ));
        }
        if !self
            .list
            .page_size_options
            .contains(&self.list.default_page_size)
        {
            return Err(crate::Error::configuration(format!(
                "list.default_page_size {} is not one of {:?}",
                self.list.default_page_size, self.list.page_size_options
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert!(config.api.api_token.is_none());
        assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(30)));

        assert_eq!(config.list.default_page_size, 20);
        assert_eq!(config.list.page_size_options, vec![10, 20, 50, 100]);
        assert_eq!(config.list.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.list.fetch_limit, 1000);
        assert_eq!(config.list.max_fetch_pages, 10);

        assert_eq!(config.notifications.ttl(), Duration::from_millis(4500));

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let api = ApiConfig {
            request_timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert_eq!(api.request_timeout(), None);
    }

    #[test]
    fn test_validate_rejects_default_size_outside_options() {
        let mut config = Config::default();
        config.list.default_page_size = 25;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_page_size 25"));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.list.page_size_options = vec![0, 20];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = Config::default();
        config.api.base_url = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_fetch_pages() {
        let mut config = Config::default();
        config.list.max_fetch_pages = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_fetch_pages"));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://api.example.com"
api_token = "secret"

[list]
default_page_size = 50

[notifications]
ttl_ms = 4000
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.api_token.as_deref(), Some("secret"));
        assert_eq!(config.list.default_page_size, 50);
        assert_eq!(config.list.page_size_options, vec![10, 20, 50, 100]);
        assert_eq!(config.notifications.ttl_ms, 4000);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let result = Config::load_from(Some(Path::new("/nonexistent/aimart-test.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
