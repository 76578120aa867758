//! Current weather for the site's home town.
//!
//! The store always holds the last known [`WeatherSnapshot`]; readers never
//! wait on the provider. Refreshes happen on the background poller or on
//! demand when the weather intent finds no reading yet.

use crate::config::WeatherConfig;
use crate::error::{AssistantError, Result};
use crate::state::SessionStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Temperature shown by the widget when no reading is available.
pub const FALLBACK_TEMPERATURE_C: i64 = 17;

/// Last known conditions. Either reading may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature in °C.
    pub temperature: Option<f64>,
    /// Wind speed in km/h.
    pub wind_speed: Option<f64>,
    /// Place the reading describes.
    pub place: String,
}

impl WeatherSnapshot {
    /// A snapshot with no readings yet.
    pub fn unknown(place: impl Into<String>) -> Self {
        Self {
            temperature: None,
            wind_speed: None,
            place: place.into(),
        }
    }

    /// Whether a temperature reading is present.
    pub fn has_reading(&self) -> bool {
        self.temperature.is_some()
    }

    /// Widget text: `"21°C (Wind: 7 km/h)"`, or the fallback label.
    pub fn widget_text(&self) -> String {
        match (self.temperature, self.wind_speed) {
            (Some(t), Some(w)) => format!("{t}°C (Wind: {w} km/h)"),
            (Some(t), None) => format!("{t}°C"),
            _ => format!("{FALLBACK_TEMPERATURE_C}°C (Fallback)"),
        }
    }
}

/// Source of current conditions.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the current conditions.
    async fn current(&self) -> Result<WeatherSnapshot>;
}

// ---------------------------------------------------------------------------
// Open-Meteo
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
    windspeed: Option<f64>,
}

/// Open-Meteo `current_weather` client.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
    place: String,
}

impl OpenMeteoClient {
    /// Create a client for the configured coordinates.
    pub fn new(config: &WeatherConfig, place: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            latitude: config.latitude,
            longitude: config.longitude,
            place: place.into(),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn current(&self) -> Result<WeatherSnapshot> {
        let url = format!("{}/v1/forecast", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                ("current_weather", "true".to_owned()),
                ("temperature_unit", "celsius".to_owned()),
            ])
            .send()
            .await
            .map_err(|e| AssistantError::Weather(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssistantError::Weather(format!(
                "provider returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| AssistantError::Weather(format!("invalid response: {e}")))?;
        let current = body
            .current_weather
            .ok_or_else(|| AssistantError::Weather("response has no current_weather".into()))?;

        Ok(WeatherSnapshot {
            temperature: current.temperature,
            wind_speed: current.windspeed,
            place: self.place.clone(),
        })
    }
}

/// Fetch from `source` and record the result in `store`.
///
/// Failures are logged and leave the last known snapshot in place.
pub async fn refresh(source: &dyn WeatherSource, store: &SessionStore) -> Option<WeatherSnapshot> {
    match source.current().await {
        Ok(snapshot) => {
            debug!(
                temperature = ?snapshot.temperature,
                wind_speed = ?snapshot.wind_speed,
                "weather refreshed"
            );
            store.record_weather(snapshot.clone());
            Some(snapshot)
        }
        Err(e) => {
            warn!("weather refresh failed: {e}");
            None
        }
    }
}
