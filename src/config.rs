//! Configuration management for `TravelAssist`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::env;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{AssistantError, Result};

const ENV_PREFIX: &str = "TRAVELASSIST";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Weather forecast API settings
    pub weather: WeatherConfig,
    /// Hosted text-completion API settings
    pub completion: CompletionConfig,
    /// Wikipedia scraping settings
    pub wiki: WikiConfig,
    /// Place data sources
    pub catalog: CatalogConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Default query settings
    pub defaults: DefaultsConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Weather API key
    pub api_key: Option<String>,
    /// Base URL for weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
}

/// Completion (itinerary) API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// Article base URL, titles are appended as path segments
    pub base_url: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
    /// Parallel page fetches during a scrape
    pub concurrency: usize,
}

/// Place data sources. Without paths the bundled dataset is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Landmark file (`.json` or sectioned `.txt`)
    pub path: Option<PathBuf>,
    /// Municipality file (`.json` records or `.txt` names)
    pub municipalities_path: Option<PathBuf>,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache directory location
    pub location: String,
    pub weather_ttl_hours: u32,
    pub wiki_ttl_hours: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// Log output destination (console, file, both)
    pub output: String,
    /// Log file path, rotated daily
    pub file_path: String,
    /// Maximum number of log files to keep
    pub max_files: u32,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Maximum number of places returned by a search
    pub max_results: usize,
    /// Number of random suggestions for a category question
    pub suggestion_count: usize,
    /// Search radius in kilometers
    pub search_radius_km: f64,
    pub itinerary_days: u32,
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("travelassist").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".travelassist-cache".to_string())
}

fn default_log_file_path() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("travelassist").join("app.log").to_string_lossy().into_owned())
        .unwrap_or_else(|| "travelassist.log".to_string())
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.weatherapi.com/v1".to_string(),
            timeout_seconds: 15,
            max_retries: 2,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 60,
            max_retries: 2,
            max_tokens: 800,
            temperature: 0.7,
        }
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/wiki".to_string(),
            timeout_seconds: 15,
            max_retries: 2,
            concurrency: 4,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: default_cache_location(),
            weather_ttl_hours: 3,
            wiki_ttl_hours: 24 * 7,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
            file_path: default_log_file_path(),
            max_files: 5,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            suggestion_count: 2,
            search_radius_km: 25.0,
            itinerary_days: 3,
        }
    }
}

impl AssistantConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.or_else(Self::get_config_path);

        if let Some(config_file) = config_file {
            if explicit && !config_file.exists() {
                return Err(AssistantError::config(format!(
                    "Config file not found: {}",
                    config_file.display()
                )));
            }
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAVELASSIST_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| AssistantError::config(format!("Failed to build configuration: {e}")))?;

        let mut config: AssistantConfig = settings
            .try_deserialize()
            .map_err(|e| {
                AssistantError::config(format!("Failed to deserialize configuration: {e}"))
            })?;

        config.apply_key_fallbacks();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travelassist").join("config.toml"))
    }

    /// Pick up API keys from the provider's conventional variables when unset
    pub fn apply_key_fallbacks(&mut self) {
        if self.weather.api_key.is_none() {
            self.weather.api_key = env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if self.completion.api_key.is_none() {
            self.completion.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys when present. Missing keys are reported at call time.
    pub fn validate_api_keys(&self) -> Result<()> {
        for (service, key) in [
            ("Weather", &self.weather.api_key),
            ("Completion", &self.completion.api_key),
        ] {
            if let Some(api_key) = key {
                if api_key.trim().is_empty() {
                    return Err(AssistantError::config(format!(
                        "{service} API key cannot be empty if provided. Either remove it or provide a valid key."
                    )));
                }
                if api_key.len() < 8 {
                    return Err(AssistantError::config(format!(
                        "{service} API key appears to be invalid (too short)."
                    )));
                }
                if api_key.len() > 200 {
                    return Err(AssistantError::config(format!(
                        "{service} API key appears to be invalid (too long)."
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (service, timeout, retries) in [
            ("Weather", self.weather.timeout_seconds, self.weather.max_retries),
            ("Completion", self.completion.timeout_seconds, self.completion.max_retries),
            ("Wiki", self.wiki.timeout_seconds, self.wiki.max_retries),
        ] {
            if timeout == 0 || timeout > 300 {
                return Err(AssistantError::config(format!(
                    "{service} API timeout cannot exceed 300 seconds and must be positive"
                )));
            }
            if retries > 10 {
                return Err(AssistantError::config(format!(
                    "{service} API max retries cannot exceed 10"
                )));
            }
        }

        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(AssistantError::config(
                "Completion temperature must be between 0.0 and 2.0",
            ));
        }

        if self.completion.max_tokens == 0 {
            return Err(AssistantError::config("Completion max tokens must be positive"));
        }

        if self.wiki.concurrency == 0 || self.wiki.concurrency > 16 {
            return Err(AssistantError::config("Wiki concurrency must be between 1 and 16"));
        }

        if self.cache.weather_ttl_hours > 168 || self.cache.wiki_ttl_hours > 24 * 90 {
            return Err(AssistantError::config(
                "Cache TTL cannot exceed 168 hours for weather or 90 days for wiki pages",
            ));
        }

        if self.defaults.max_results == 0 || self.defaults.max_results > 100 {
            return Err(AssistantError::config("Maximum results must be between 1 and 100"));
        }

        if self.defaults.suggestion_count == 0 {
            return Err(AssistantError::config("Suggestion count must be positive"));
        }

        if !(self.defaults.search_radius_km > 0.0 && self.defaults.search_radius_km <= 500.0) {
            return Err(AssistantError::config("Search radius must be between 0 and 500 km"));
        }

        if self.defaults.itinerary_days == 0 || self.defaults.itinerary_days > 14 {
            return Err(AssistantError::config("Itinerary days must be between 1 and 14"));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AssistantError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AssistantError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        let valid_outputs = ["console", "file", "both"];
        if !valid_outputs.contains(&self.logging.output.as_str()) {
            return Err(AssistantError::config(format!(
                "Invalid log output '{}'. Must be one of: {}",
                self.logging.output,
                valid_outputs.join(", ")
            )));
        }

        for (service, url) in [
            ("Weather", &self.weather.base_url),
            ("Completion", &self.completion.base_url),
            ("Wiki", &self.wiki.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AssistantError::config(format!(
                    "{service} API base URL must be a valid HTTP or HTTPS URL"
                )));
            }
        }

        if self.cache.enabled && self.cache.location.trim().is_empty() {
            return Err(AssistantError::config("Cache location cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.weather.base_url, "https://api.weatherapi.com/v1");
        assert_eq!(config.weather.timeout_seconds, 15);
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.suggestion_count, 2);
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        let mut config = AssistantConfig::default();
        config.weather.api_key = Some("valid_api_key_123".to_string());
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = AssistantConfig::default();
        config.completion.api_key = Some("abc".to_string());
        let result = config.validate_api_keys();
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AssistantConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AssistantConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = AssistantConfig::default();
        config.completion.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = AssistantConfig::default();
        config.wiki.base_url = "en.wikipedia.org".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("HTTP or HTTPS"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "file_key_12345"
timeout_seconds = 20

[defaults]
max_results = 7

[cache]
enabled = false
"#
        )
        .unwrap();

        // The file extension is not .toml, so the format is forced explicitly
        let config = AssistantConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("file_key_12345"));
        assert_eq!(config.weather.timeout_seconds, 20);
        assert_eq!(config.weather.max_retries, 2);
        assert_eq!(config.defaults.max_results, 7);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result =
            AssistantConfig::load_from_path(Some(PathBuf::from("/nonexistent/travelassist.toml")));
        assert!(matches!(result, Err(AssistantError::Config { .. })));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AssistantConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("travelassist"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
