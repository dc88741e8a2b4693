use crate::models::RankingParams;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_config_dir() -> String {
    "config/filters".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_fetch_limit() -> usize {
    100
}

fn default_sample_size() -> usize {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    120
}

fn default_cache_entries() -> u64 {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Delay before an edited query actually hits the item source.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    250
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    #[serde(default = "default_base")]
    pub base: f64,
    #[serde(default = "default_decay")]
    pub decay: f64,
    #[serde(default = "default_high_priority_threshold")]
    pub high_priority_threshold: f64,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            base: default_base(),
            decay: default_decay(),
            high_priority_threshold: default_high_priority_threshold(),
        }
    }
}

impl RankingSettings {
    pub fn params(&self) -> RankingParams {
        RankingParams {
            base: self.base,
            decay: self.decay,
            high_priority_threshold: self.high_priority_threshold,
        }
    }
}

fn default_base() -> f64 {
    5.0
}

fn default_decay() -> f64 {
    0.65
}

fn default_high_priority_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with RANK_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with RANK_)
            // e.g., RANK_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RANK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RANK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the plain provider environment variables that deploys tend to set
/// without the `RANK__` prefix.
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let provider_base_url = env::var("PROVIDER_BASE_URL")
        .or_else(|_| env::var("RANK_PROVIDER__BASE_URL"))
        .ok();
    let provider_api_key = env::var("PROVIDER_API_KEY")
        .or_else(|_| env::var("RANK_PROVIDER__API_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(base_url) = provider_base_url {
        builder = builder.set_override("provider.base_url", base_url)?;
    }
    if let Some(api_key) = provider_api_key {
        builder = builder.set_override("provider.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranking_params() {
        let ranking = RankingSettings::default();
        let params = ranking.params();
        assert_eq!(params.base, 5.0);
        assert_eq!(params.decay, 0.65);
        assert_eq!(params.high_priority_threshold, 0.5);
    }

    #[test]
    fn test_default_settings() {
        let server = ServerSettings::default();
        assert_eq!(server.port, 8080);

        let cache = CacheSettings::default();
        assert_eq!(cache.ttl_secs, 120);
        assert_eq!(cache.max_entries, 256);

        let search = SearchSettings::default();
        assert_eq!(search.debounce_ms, 250);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
