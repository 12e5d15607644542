//! meteo-core - The brain of the meteo weather assistant
//!
//! This crate provides:
//! - Intent & city extraction from free-text weather questions
//! - A city validation seam with geocoding and fixed-list implementations
//! - An OpenWeather client, forecast aggregation and city comparison
//! - The assistant that turns a message into an answer with reasoning steps

pub mod advice;
pub mod assistant;
pub mod intent;
pub mod types;
pub mod validator;
pub mod weather;

// Re-export main types for convenience
pub use assistant::Assistant;
pub use intent::{Intent, IntentResult, classify};
pub use types::{ChatRequest, ChatResponse, ForecastData, MultiCityData, ResponseData};
pub use validator::{CityList, CityValidator};
pub use weather::{
    Comparison, ForecastPoint, ForecastSummary, OpenWeatherClient, WeatherError,
    WeatherProvider, WeatherSnapshot,
};
