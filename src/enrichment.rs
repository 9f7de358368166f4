use std::time::Duration;
use serde::Deserialize;
use tokio::time::timeout;

use crate::config::Config;
use crate::context::{Location, Weather};
use crate::error::{Result, ThemeError};

/// Loose ip-api style shape; every field is optional and anything the
/// service omits simply stays absent on the context.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    #[serde(default)]
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    #[serde(default)]
    main: Option<WeatherMain>,
}

/// Single-attempt, timeout-bounded lookups. Expiry drops the in-flight
/// future, so a late response can never land on a newer context.
pub struct EnrichmentClient {
    client: reqwest::Client,
    config: Config,
}

impl EnrichmentClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.enrichment_timeout_secs))
            .build()
            .unwrap_or_default();

        EnrichmentClient {
            client,
            config: config.clone(),
        }
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.enrichment_timeout_secs)
    }

    pub async fn fetch_location(&self) -> Result<Location> {
        let request = self.client.get(&self.config.geo_endpoint).send();

        let response = timeout(self.deadline(), request)
            .await
            .map_err(|_| ThemeError::Signal("geolocation request timed out".to_string()))?
            .map_err(|e| ThemeError::Signal(format!("geolocation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ThemeError::Signal(format!(
                "geolocation service returned {}",
                response.status()
            )));
        }

        let geo: GeoResponse = response
            .json()
            .await
            .map_err(|e| ThemeError::Signal(format!("geolocation response unreadable: {}", e)))?;

        Ok(Location {
            city: geo.city,
            country: geo.country,
            timezone: geo.timezone,
            lat: geo.lat,
            lon: geo.lon,
        })
    }

    pub async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<Weather> {
        let api_key = self
            .config
            .weather_api_key
            .as_deref()
            .ok_or_else(|| ThemeError::Signal("weather API key not configured".to_string()))?;

        let request = self
            .client
            .get(&self.config.weather_endpoint)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", api_key.to_string()),
            ])
            .send();

        let response = timeout(self.deadline(), request)
            .await
            .map_err(|_| ThemeError::Signal("weather request timed out".to_string()))?
            .map_err(|e| ThemeError::Signal(format!("weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ThemeError::Signal(format!(
                "weather service returned {}",
                response.status()
            )));
        }

        let payload: WeatherResponse = response
            .json()
            .await
            .map_err(|e| ThemeError::Signal(format!("weather response unreadable: {}", e)))?;

        let condition = payload
            .weather
            .first()
            .and_then(|w| w.main.clone())
            .ok_or_else(|| ThemeError::Signal("weather response missing condition".to_string()))?;

        Ok(Weather {
            condition,
            temperature: payload.main.and_then(|m| m.temp),
            description: payload.weather.first().and_then(|w| w.description.clone()),
        })
    }
}
