//! Weather data: provider seam, snapshot types, forecast aggregation and
//! city comparison.

mod openweather;

pub use openweather::OpenWeatherClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of 3-hour forecast points summarized (24 hours)
pub const DEFAULT_FORECAST_WINDOW: usize = 8;

/// Errors from a weather provider
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API key not configured")]
    MissingApiKey,
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("city not found: {0}")]
    NotFound(String),
    #[error("unexpected weather payload: {0}")]
    Malformed(String),
}

/// Current conditions for one city (metric units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    /// °C
    pub temp: f64,
    /// Apparent temperature, °C
    pub feels: Option<f64>,
    /// Relative humidity, %
    pub humidity: Option<u8>,
    pub wind_kmh: Option<f64>,
    pub condition: String,
}

impl WeatherSnapshot {
    /// One-line rendering, e.g. "Pune: 25.3°C, clear sky"
    pub fn headline(&self) -> String {
        format!("{}: {:.1}°C, {}", self.city, self.temp, self.condition)
    }
}

/// A single forecast sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temp: f64,
    pub humidity: Option<u8>,
    pub wind_kmh: Option<f64>,
    pub condition: String,
}

/// Aggregate over the first few forecast points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub city: String,
    /// Number of points aggregated
    pub points: usize,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub avg_temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_humidity: Option<f64>,
    pub dominant_condition: String,
    pub summary: String,
}

/// Side-by-side current weather for two cities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub city1_weather: WeatherSnapshot,
    pub city2_weather: WeatherSnapshot,
    pub winner: String,
}

/// Source of weather data
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, WeatherError>;
}

/// Summarize the first `window` forecast points.
///
/// Returns `None` when there is nothing to summarize. The dominant condition
/// is the most frequent one; ties go to the condition seen first.
pub fn summarize_forecast(
    city: &str,
    points: &[ForecastPoint],
    window: usize,
) -> Option<ForecastSummary> {
    let window = &points[..points.len().min(window)];
    let (first, last) = (window.first()?, window.last()?);

    let count = window.len() as f64;
    let temps = window.iter().map(|p| p.temp);
    let avg_temp = round1(temps.clone().sum::<f64>() / count);
    let min_temp = round1(temps.clone().fold(f64::INFINITY, f64::min));
    let max_temp = round1(temps.fold(f64::NEG_INFINITY, f64::max));

    let humidities: Vec<f64> = window
        .iter()
        .filter_map(|p| p.humidity.map(f64::from))
        .collect();
    let avg_humidity = if humidities.is_empty() {
        None
    } else {
        Some(round1(humidities.iter().sum::<f64>() / humidities.len() as f64))
    };

    let mut tally: Vec<(&str, usize)> = Vec::new();
    for point in window {
        match tally.iter_mut().find(|(c, _)| *c == point.condition) {
            Some((_, n)) => *n += 1,
            None => tally.push((point.condition.as_str(), 1)),
        }
    }
    let dominant_condition = tally
        .iter()
        .fold(None::<(&str, usize)>, |best, &(c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c.to_string())
        .unwrap_or_default();

    let hours = (last.time - first.time).num_hours() + 3;
    let summary = format!(
        "Next {}h in {}: avg {:.1}°C (min {:.1}°C, max {:.1}°C), mostly {}.",
        hours, city, avg_temp, min_temp, max_temp, dominant_condition
    );

    Some(ForecastSummary {
        city: city.to_string(),
        points: window.len(),
        from: first.time,
        to: last.time,
        avg_temp,
        min_temp,
        max_temp,
        avg_humidity,
        dominant_condition,
        summary,
    })
}

/// Compare two cities by temperature.
pub fn compare(first: WeatherSnapshot, second: WeatherSnapshot) -> Comparison {
    let diff = round1(first.temp - second.temp);
    let winner = if diff > 0.0 {
        format!("{} is warmer than {} by {:.1}°C", first.city, second.city, diff)
    } else if diff < 0.0 {
        format!("{} is warmer than {} by {:.1}°C", second.city, first.city, -diff)
    } else {
        format!("{} and {} have the same temperature", first.city, second.city)
    };

    Comparison {
        city1_weather: first,
        city2_weather: second,
        winner,
    }
}

/// m/s to km/h, one decimal
pub(crate) fn ms_to_kmh(speed: f64) -> f64 {
    round1(speed * 3.6)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
