//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the wind-sniff.toml file.
//! It provides a centralized way to configure the WillyWeather API, the saved
//! stations, and display options.
//!
//! ```toml
//! [api]
//! base_url = "https://api.willyweather.com.au/v2"
//! key_env = "WILLYWEATHER_API_KEY"
//! cache_ttl_minutes = 10
//!
//! [display]
//! speed_unit = "knots"
//! chart_step_minutes = 10
//! dst_policy = "compatible"
//! sort_order = "wind_speed"
//!
//! [[stations]]
//! id = "4988"
//! name = "Manly"
//! ```

use crate::{
    forecast::SortOrder, interpolate::DEFAULT_STEP_MINUTES, local_time::DstPolicy, units::SpeedUnit,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default config file, relative to the working directory
pub const CONFIG_FILE: &str = "wind-sniff.toml";

/// Application configuration loaded from wind-sniff.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// WillyWeather API access
    pub api: ApiConfig,
    /// Display and unit preferences
    pub display: DisplayConfig,
    /// Saved stations, shown in order
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API root, without the key segment
    pub base_url: String,
    /// Environment variable holding the API key (kept out of the file)
    pub key_env: String,
    /// How long a fetched forecast is reused
    pub cache_ttl_minutes: u64,
    /// Directory for the on-disk forecast cache; in-memory when unset
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Wind speed unit: "knots", "km/h" or "mph"
    pub speed_unit: SpeedUnit,
    /// Minutes between tide chart samples
    pub chart_step_minutes: i64,
    /// Resolution of tide times that fall in a DST gap or overlap
    #[serde(default)]
    pub dst_policy: DstPolicy,
    /// Station list order: "alphabetical", "wind_speed", "latitude" or "last_updated"
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// A saved WillyWeather location
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StationConfig {
    /// WillyWeather location id
    pub id: String,
    /// Display name
    pub name: String,
    /// IANA zone used when the API response omits one
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "https://api.willyweather.com.au/v2".to_string(),
                key_env: "WILLYWEATHER_API_KEY".to_string(),
                cache_ttl_minutes: 10,
                cache_path: None,
            },
            display: DisplayConfig {
                speed_unit: SpeedUnit::Knots,
                chart_step_minutes: 10,
                dst_policy: DstPolicy::Compatible,
                sort_order: SortOrder::Alphabetical,
            },
            stations: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }
}

impl DisplayConfig {
    /// Chart sample spacing; out-of-range values fall back to the default step.
    pub fn chart_step(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.chart_step_minutes)
            .filter(|step| *step > chrono::Duration::zero())
            .unwrap_or_else(|| {
                warn!(
                    chart_step_minutes = self.chart_step_minutes,
                    "invalid chart step, using default"
                );
                chrono::Duration::minutes(DEFAULT_STEP_MINUTES)
            })
    }
}

impl Config {
    /// Load configuration from wind-sniff.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        stations = config.stations.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Look up a saved station by id
    pub fn station(&self, id: &str) -> Option<&StationConfig> {
        self.stations.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.key_env, "WILLYWEATHER_API_KEY");
        assert_eq!(config.api.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.display.speed_unit, SpeedUnit::Knots);
        assert_eq!(config.display.dst_policy, DstPolicy::Compatible);
        assert!(config.stations.is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.stations.push(StationConfig {
            id: "4988".to_string(),
            name: "Manly".to_string(),
            time_zone: Some("Australia/Sydney".to_string()),
        });
        config.display.speed_unit = SpeedUnit::Kmh;
        config.display.sort_order = SortOrder::Latitude;

        let file = NamedTempFile::new().unwrap();
        config.save_to_path(file.path()).unwrap();
        let loaded = Config::load_from_path(file.path());
        assert_eq!(loaded, config);
        assert_eq!(loaded.station("4988").unwrap().name, "Manly");
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let toml_str = r#"
            [api]
            base_url = "http://localhost:8080"
            key_env = "WW_KEY"
            cache_ttl_minutes = 1

            [display]
            speed_unit = "mph"
            chart_step_minutes = 30
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.display.dst_policy, DstPolicy::Compatible);
        assert_eq!(config.display.sort_order, SortOrder::Alphabetical);
        assert_eq!(config.api.cache_path, None);
        assert!(config.stations.is_empty());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "not = [valid").unwrap();
        assert_eq!(Config::load_from_path(file.path()), Config::default());
    }

    #[test]
    fn test_extreme_durations_do_not_overflow() {
        let mut config = Config::default();
        config.api.cache_ttl_minutes = u64::MAX;
        assert_eq!(config.api.cache_ttl(), Duration::from_secs(u64::MAX));

        config.display.chart_step_minutes = i64::MAX;
        assert_eq!(config.display.chart_step(), chrono::Duration::minutes(10));
        config.display.chart_step_minutes = -5;
        assert_eq!(config.display.chart_step(), chrono::Duration::minutes(10));
        config.display.chart_step_minutes = 30;
        assert_eq!(config.display.chart_step(), chrono::Duration::minutes(30));
    }
}
