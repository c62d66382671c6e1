//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\metafill\config.toml
//! - macOS: ~/Library/Application Support/metafill/config.toml
//! - Linux: ~/.config/metafill/config.toml
//!
//! Every field has a default, so a partial file (or none at all) is fine.
//! Scoring weights, thresholds and biases are tuned defaults; change them
//! here rather than in code.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::{LocalScoring, ProviderOptions, RetryPolicy, ScoringConfig, Source};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which catalogs to use and how to talk to them
    pub providers: ProvidersConfig,

    /// Cross-provider composite scoring
    pub scoring: ScoringConfig,

    /// Widen-and-retry policy for track resolution
    pub retry: RetryPolicy,

    /// Library backfill settings
    pub batch: BatchConfig,
}

/// Provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Catalog tags in query order (`qq`, `netease`, `kugou`)
    pub enabled: Vec<String>,

    /// Raw results requested per search
    pub fetch_limit: usize,

    /// Candidates kept per provider after local ranking
    pub keep: usize,

    /// Timeout for search and detail requests
    pub request_timeout_ms: u64,

    /// Timeout for the primary cover reachability probe
    pub cover_probe_timeout_ms: u64,

    /// Timeout for each fallback cover probe
    pub fallback_probe_timeout_ms: u64,

    /// Overall budget for one provider within an aggregated search
    pub provider_timeout_ms: u64,

    /// Remember recent queries per provider
    pub cache: bool,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,

    /// Provider-local admission scoring; unset fields keep that
    /// provider's own default
    pub qq: ScoringOverrides,
    pub netease: ScoringOverrides,
    pub kugou: ScoringOverrides,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            enabled: Source::ALL.iter().map(|s| s.tag().to_string()).collect(),
            fetch_limit: 10,
            keep: 3,
            request_timeout_ms: 10_000,
            cover_probe_timeout_ms: 700,
            fallback_probe_timeout_ms: 500,
            provider_timeout_ms: 20_000,
            cache: true,
            cache_capacity: 64,
            cache_ttl_secs: 600,
            qq: LocalScoring::qq().into(),
            netease: LocalScoring::netease().into(),
            kugou: LocalScoring::kugou().into(),
        }
    }
}

impl ProvidersConfig {
    /// Enabled catalogs in configured order; unknown tags are skipped.
    pub fn sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        for tag in &self.enabled {
            match Source::parse(tag) {
                Some(source) if !sources.contains(&source) => sources.push(source),
                Some(_) => {}
                None => tracing::warn!("Ignoring unknown provider {:?} in config", tag),
            }
        }
        sources
    }

    /// Runtime options for one catalog.
    pub fn options_for(&self, source: Source) -> ProviderOptions {
        let overrides = match source {
            Source::Qq => self.qq,
            Source::Netease => self.netease,
            Source::Kugou => self.kugou,
        };
        let scoring = overrides.apply(LocalScoring::for_source(source));
        ProviderOptions {
            fetch_limit: self.fetch_limit.max(1),
            keep: self.keep.max(1),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            cover_probe_timeout: Duration::from_millis(self.cover_probe_timeout_ms),
            fallback_probe_timeout: Duration::from_millis(self.fallback_probe_timeout_ms),
            scoring,
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Partial [`LocalScoring`] as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_threshold: Option<f64>,
}

impl ScoringOverrides {
    pub fn apply(&self, base: LocalScoring) -> LocalScoring {
        LocalScoring {
            title_weight: self.title_weight.unwrap_or(base.title_weight),
            artist_weight: self.artist_weight.unwrap_or(base.artist_weight),
            album_weight: self.album_weight.unwrap_or(base.album_weight),
            admission_threshold: self.admission_threshold.unwrap_or(base.admission_threshold),
        }
    }
}

impl From<LocalScoring> for ScoringOverrides {
    fn from(scoring: LocalScoring) -> Self {
        Self {
            title_weight: Some(scoring.title_weight),
            artist_weight: Some(scoring.artist_weight),
            album_weight: Some(scoring.album_weight),
            admission_threshold: Some(scoring.admission_threshold),
        }
    }
}

/// Library backfill settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Tracks resolved concurrently
    pub concurrency: usize,

    /// Use embedded or sidecar artwork before searching
    pub local_first: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            local_first: true,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("metafill"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path.
///
/// Logs problems but never fails; we always return a usable config.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to `path`, creating its directory if needed.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_serializes() {
        let toml = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml.contains("[providers]"));
        assert!(toml.contains("[scoring]"));
        assert!(toml.contains("[retry]"));
        assert!(toml.contains("[batch]"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[providers]
enabled = ["netease", "kugou"]

[providers.qq]
admission_threshold = 0.7

[providers.netease]
album_weight = 0.2

[scoring.source_bias]
kugou = 0.02
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.providers.sources(), vec![Source::Netease, Source::Kugou]);
        let qq = config.providers.options_for(Source::Qq).scoring;
        assert_eq!(qq.admission_threshold, 0.7);
        assert_eq!(qq.title_weight, 0.6);
        let netease = config.providers.options_for(Source::Netease).scoring;
        assert_eq!(netease.album_weight, 0.2);
        assert_eq!(netease.title_weight, 0.55);
        assert_eq!(netease.admission_threshold, 0.2);
        let kugou = config.providers.options_for(Source::Kugou).scoring;
        assert_eq!(kugou, LocalScoring::kugou());
        assert_eq!(config.scoring.source_bias.kugou, 0.02);
        assert_eq!(config.scoring.source_bias.qq, 0.01);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.batch.concurrency, 20);
    }

    #[test]
    fn test_unknown_and_duplicate_sources_skipped() {
        let providers = ProvidersConfig {
            enabled: vec!["qq".into(), "spotify".into(), "QQ".into(), "b".into()],
            ..ProvidersConfig::default()
        };
        assert_eq!(providers.sources(), vec![Source::Qq, Source::Netease]);
    }

    #[test]
    fn test_options_use_per_source_scoring() {
        let providers = ProvidersConfig::default();
        let netease = providers.options_for(Source::Netease);
        assert_eq!(netease.scoring, LocalScoring::netease());
        assert_eq!(netease.cover_probe_timeout, Duration::from_millis(700));
        assert_eq!(netease.keep, 3);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.retry.max_attempts = 5;
        config.scoring.jitter_seed = Some(42);
        config.batch.local_first = false;
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.retry.max_attempts, 5);
        assert_eq!(loaded.scoring.jitter_seed, Some(42));
        assert!(!loaded.batch.local_first);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is [not toml").unwrap();
        let config = load_from(&path);
        assert_eq!(config.providers.fetch_limit, 10);
    }
}
