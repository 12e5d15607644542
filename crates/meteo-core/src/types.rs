//! Shared request/response types for meteo-core

use serde::{Deserialize, Serialize};

use crate::intent::IntentResult;
use crate::weather::{Comparison, ForecastSummary, WeatherSnapshot};

/// A free-text question from a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Structured payload accompanying an answer.
///
/// Serialized untagged; clients tell the shapes apart by their keys:
/// `city1_weather` for comparisons, `forecast` for forecasts, `temp` for a
/// single city and `"type": "multi"` for several cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Comparison(Comparison),
    Forecast(ForecastData),
    Current(WeatherSnapshot),
    Multi(MultiCityData),
}

impl ResponseData {
    pub fn forecast(summary: ForecastSummary) -> Self {
        Self::Forecast(ForecastData { forecast: summary })
    }

    pub fn multi(cities: Vec<WeatherSnapshot>) -> Self {
        Self::Multi(MultiCityData {
            kind: MultiKind::Multi,
            cities,
        })
    }
}

/// `{"forecast": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    pub forecast: ForecastSummary,
}

/// `{"type": "multi", "cities": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCityData {
    #[serde(rename = "type")]
    pub kind: MultiKind,
    pub cities: Vec<WeatherSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiKind {
    Multi,
}

/// Answer to a [`ChatRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub request_id: String,
    pub answer: String,
    pub reasoning_steps: Vec<String>,
    pub intent: IntentResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    /// Set when weather could not be fetched
    pub error: Option<String>,
}
