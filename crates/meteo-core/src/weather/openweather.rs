//! OpenWeather REST client: current conditions, 5-day/3-hour forecast and
//! direct geocoding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ForecastPoint, WeatherError, WeatherProvider, WeatherSnapshot, ms_to_kmh};
use crate::validator::CityValidator;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather API client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Mask the API key in debug output
        let chars: Vec<char> = self.api_key.chars().collect();
        let masked_key = if chars.len() > 7 {
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", prefix, suffix)
        } else {
            "***".to_string()
        };

        f.debug_struct("OpenWeatherClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &masked_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenWeatherClient {
    /// Create a client whose requests each time out after `timeout`
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL (e.g. for a proxy or a local mock)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Look up the canonical name of a place. `Ok(None)` when nothing matches.
    pub async fn geocode(&self, query: &str) -> Result<Option<String>, WeatherError> {
        let body = self
            .get("/geo/1.0/direct", &[("q", query), ("limit", "1")], query)
            .await?;
        parse_geocode(&body)
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        city: &str,
    ) -> Result<String, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::MissingApiKey);
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} for {:?}", path, city);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound(city.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let body = self
            .get("/data/2.5/weather", &[("q", city), ("units", "metric")], city)
            .await?;
        parse_current(&body, city)
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, WeatherError> {
        let body = self
            .get("/data/2.5/forecast", &[("q", city), ("units", "metric")], city)
            .await?;
        parse_forecast(&body)
    }
}

#[async_trait]
impl CityValidator for OpenWeatherClient {
    async fn validate(&self, candidate: &str) -> Option<String> {
        match self.geocode(candidate).await {
            Ok(found) => found,
            Err(WeatherError::NotFound(_)) => None,
            Err(e) => {
                warn!("Geocoding lookup for {:?} failed: {}", candidate, e);
                None
            }
        }
    }
}

// ── Response payloads ──

#[derive(Deserialize)]
struct CurrentResponse {
    name: Option<String>,
    main: MainBlock,
    wind: Option<WindBlock>,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: MainBlock,
    wind: Option<WindBlock>,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Deserialize)]
struct ConditionBlock {
    description: String,
}

#[derive(Deserialize)]
struct GeocodeHit {
    name: String,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, WeatherError> {
    serde_json::from_str(body).map_err(|e| WeatherError::Malformed(e.to_string()))
}

fn condition_of(blocks: &[ConditionBlock]) -> String {
    blocks
        .first()
        .map(|c| c.description.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_current(body: &str, requested: &str) -> Result<WeatherSnapshot, WeatherError> {
    let data: CurrentResponse = decode(body)?;
    let city = data
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| requested.to_string());

    Ok(WeatherSnapshot {
        city,
        temp: data.main.temp,
        feels: data.main.feels_like,
        humidity: data.main.humidity,
        wind_kmh: data.wind.map(|w| ms_to_kmh(w.speed)),
        condition: condition_of(&data.weather),
    })
}

fn parse_forecast(body: &str) -> Result<Vec<ForecastPoint>, WeatherError> {
    let data: ForecastResponse = decode(body)?;
    data.list
        .into_iter()
        .map(|entry| {
            let time: DateTime<Utc> = DateTime::from_timestamp(entry.dt, 0)
                .ok_or_else(|| WeatherError::Malformed(format!("bad timestamp {}", entry.dt)))?;
            Ok(ForecastPoint {
                time,
                temp: entry.main.temp,
                humidity: entry.main.humidity,
                wind_kmh: entry.wind.map(|w| ms_to_kmh(w.speed)),
                condition: condition_of(&entry.weather),
            })
        })
        .collect()
}

fn parse_geocode(body: &str) -> Result<Option<String>, WeatherError> {
    let hits: Vec<GeocodeHit> = decode(body)?;
    Ok(hits
        .into_iter()
        .map(|hit| hit.name)
        .find(|name| !name.trim().is_empty()))
}
