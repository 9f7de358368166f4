use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use url::Url;

const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";
const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default = "default_geo_endpoint")]
    pub geo_endpoint: String,
    #[serde(default = "default_weather_endpoint")]
    pub weather_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,
    #[serde(default = "default_enrichment_timeout")]
    pub enrichment_timeout_secs: u64,
    #[serde(default = "default_morph_interval")]
    pub morph_interval_secs: u64,
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_secs: u64,
}

fn default_geo_endpoint() -> String {
    DEFAULT_GEO_ENDPOINT.to_string()
}

fn default_weather_endpoint() -> String {
    DEFAULT_WEATHER_ENDPOINT.to_string()
}

fn default_enrichment_timeout() -> u64 {
    3
}

fn default_morph_interval() -> u64 {
    30
}

fn default_idle_threshold() -> u64 {
    45
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("aitheme")
        });

        // Ensure data directory exists
        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        // Try to load existing config
        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if !config_str.trim().is_empty() {
                match serde_json::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        config.data_dir = data_dir;
                        config.apply_env_fallbacks();
                        config.validate_endpoints();
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to parse existing config.json: {}, recreating defaults", e);
                    }
                }
            }
        }

        // Create default config
        let mut config = Self::default_config(data_dir);
        config.apply_env_fallbacks();

        let json_str = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config")?;
        std::fs::write(&config_path, json_str)
            .context("Failed to write default config.json")?;

        Ok(config)
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            geo_endpoint: default_geo_endpoint(),
            weather_endpoint: default_weather_endpoint(),
            weather_api_key: None,
            enrichment_timeout_secs: default_enrichment_timeout(),
            morph_interval_secs: default_morph_interval(),
            idle_threshold_secs: default_idle_threshold(),
        }
    }

    fn apply_env_fallbacks(&mut self) {
        if self.weather_api_key.as_ref().map_or(true, |key| key.is_empty()) {
            self.weather_api_key = std::env::var("AITHEME_WEATHER_API_KEY").ok();
        }
    }

    // An unparsable endpoint override falls back to the default rather than
    // breaking collection later.
    fn validate_endpoints(&mut self) {
        if Url::parse(&self.geo_endpoint).is_err() {
            log::warn!("Invalid geo endpoint '{}', using default", self.geo_endpoint);
            self.geo_endpoint = default_geo_endpoint();
        }
        if Url::parse(&self.weather_endpoint).is_err() {
            log::warn!("Invalid weather endpoint '{}', using default", self.weather_endpoint);
            self.weather_endpoint = default_weather_endpoint();
        }
    }

    pub fn preferences_file(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    pub fn recent_themes_file(&self) -> PathBuf {
        self.data_dir.join("recent_themes.json")
    }

    pub fn visits_file(&self) -> PathBuf {
        self.data_dir.join("visits.json")
    }

    pub fn morph_history_file(&self) -> PathBuf {
        self.data_dir.join("morph_history.json")
    }
}
