//! Weather assistant - answers one message end to end
//!
//! Classifies the message, fetches whatever weather the intent calls for and
//! assembles a templated answer together with the reasoning steps taken.
//! Failures never escape: they are reported in the response's `error` field
//! and in the reasoning trace.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::advice::advise;
use crate::intent::{self, Intent, IntentResult};
use crate::types::{ChatResponse, ResponseData};
use crate::validator::CityValidator;
use crate::weather::{
    self, DEFAULT_FORECAST_WINDOW, WeatherError, WeatherProvider, WeatherSnapshot,
};

const NO_CITY_ANSWER: &str = "Please mention at least one city.";

/// Answer text, payload and error for one handled message
struct Outcome {
    answer: String,
    data: Option<ResponseData>,
    error: Option<String>,
}

impl Outcome {
    fn answer(answer: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            answer: answer.into(),
            data,
            error: None,
        }
    }

    fn failed(city: &str, err: &WeatherError) -> Self {
        Self {
            answer: format!("Unable to fetch weather for {}.", city),
            data: None,
            error: Some(err.to_string()),
        }
    }
}

/// Message handler tying city resolution to a weather provider
pub struct Assistant {
    validator: Arc<dyn CityValidator>,
    weather: Arc<dyn WeatherProvider>,
    forecast_window: usize,
}

impl Assistant {
    pub fn new(validator: Arc<dyn CityValidator>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            validator,
            weather,
            forecast_window: DEFAULT_FORECAST_WINDOW,
        }
    }

    /// Set how many forecast points are summarized
    pub fn with_forecast_window(mut self, window: usize) -> Self {
        self.forecast_window = window.max(1);
        self
    }

    /// The weather provider this assistant fetches from
    pub fn weather(&self) -> &Arc<dyn WeatherProvider> {
        &self.weather
    }

    /// Intent and cities for a message, without fetching any weather
    pub async fn classify(&self, message: &str) -> IntentResult {
        intent::classify(message, self.validator.as_ref()).await
    }

    /// Handle a message and produce an answer
    pub async fn handle_message(&self, message: &str) -> ChatResponse {
        let request_id = Uuid::new_v4().to_string();
        info!("Handling message {} ({} chars)", request_id, message.len());

        let intent = self.classify(message).await;
        let mut steps = vec![format!(
            "Detected intent: {}, cities: [{}], confidence: {}",
            intent.intent,
            intent.cities.join(", "),
            intent.confidence
        )];

        let outcome = match (intent.intent, intent.cities.as_slice()) {
            (_, []) => Outcome::answer(NO_CITY_ANSWER, None),
            (Intent::Forecast, [city, ..]) => self.forecast(city, &mut steps).await,
            (Intent::Comparison, [first, second, ..]) => {
                self.compare(first, second, &mut steps).await
            }
            (Intent::Comparison, cities) => {
                steps.push("Comparison needs two cities; showing current weather".to_string());
                self.current(cities, &mut steps).await
            }
            (Intent::Advice, [city, ..]) => self.advice(city, &mut steps).await,
            (Intent::CurrentWeather | Intent::Unknown, cities) => {
                self.current(cities, &mut steps).await
            }
        };

        ChatResponse {
            request_id,
            answer: outcome.answer,
            reasoning_steps: steps,
            intent,
            data: outcome.data,
            error: outcome.error,
        }
    }

    async fn fetch_current(
        &self,
        city: &str,
        steps: &mut Vec<String>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        match self.weather.current(city).await {
            Ok(snapshot) => {
                steps.push(format!("Weather fetched successfully for {}", city));
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Weather fetch failed for {}: {}", city, e);
                steps.push(format!("Weather fetch failed for {}: {}", city, e));
                Err(e)
            }
        }
    }

    async fn current(&self, cities: &[String], steps: &mut Vec<String>) -> Outcome {
        let mut fetched = Vec::new();
        let mut last_failure = None;
        for city in cities {
            match self.fetch_current(city, steps).await {
                Ok(snapshot) => fetched.push(snapshot),
                Err(e) => last_failure = Some((city.as_str(), e)),
            }
        }

        match (fetched.len(), last_failure) {
            (0, Some((city, e))) => Outcome::failed(city, &e),
            (1, _) if cities.len() == 1 => {
                let snapshot = fetched.remove(0);
                Outcome::answer(snapshot.headline(), Some(ResponseData::Current(snapshot)))
            }
            _ => {
                let answer = fetched
                    .iter()
                    .map(WeatherSnapshot::headline)
                    .collect::<Vec<_>>()
                    .join("\n");
                Outcome::answer(answer, Some(ResponseData::multi(fetched)))
            }
        }
    }

    async fn forecast(&self, city: &str, steps: &mut Vec<String>) -> Outcome {
        let points = match self.weather.forecast(city).await {
            Ok(points) => points,
            Err(e) => {
                warn!("Forecast fetch failed for {}: {}", city, e);
                steps.push(format!("Forecast fetch failed for {}: {}", city, e));
                return Outcome::failed(city, &e);
            }
        };
        steps.push(format!(
            "Forecast fetched successfully for {} ({} points)",
            city,
            points.len()
        ));

        match weather::summarize_forecast(city, &points, self.forecast_window) {
            Some(summary) => {
                steps.push(format!("Summarized {} forecast points", summary.points));
                Outcome::answer(summary.summary.clone(), Some(ResponseData::forecast(summary)))
            }
            None => {
                let err = WeatherError::Malformed("forecast contained no data points".to_string());
                steps.push(format!("Forecast for {} was empty", city));
                Outcome::failed(city, &err)
            }
        }
    }

    async fn compare(&self, first: &str, second: &str, steps: &mut Vec<String>) -> Outcome {
        let a = match self.fetch_current(first, steps).await {
            Ok(a) => a,
            Err(e) => return Outcome::failed(first, &e),
        };
        let b = match self.fetch_current(second, steps).await {
            Ok(b) => b,
            Err(e) => return Outcome::failed(second, &e),
        };

        let comparison = weather::compare(a, b);
        steps.push(format!("Compared {} and {}", first, second));
        let answer = format!(
            "{}.\n{}\n{}",
            comparison.winner,
            comparison.city1_weather.headline(),
            comparison.city2_weather.headline()
        );
        Outcome::answer(answer, Some(ResponseData::Comparison(comparison)))
    }

    async fn advice(&self, city: &str, steps: &mut Vec<String>) -> Outcome {
        let snapshot = match self.fetch_current(city, steps).await {
            Ok(s) => s,
            Err(e) => return Outcome::failed(city, &e),
        };

        let tips = advise(&snapshot);
        steps.push(format!("Derived {} advice tips for {}", tips.len(), city));
        let mut answer = snapshot.headline();
        for tip in &tips {
            answer.push_str("\n- ");
            answer.push_str(tip);
        }
        Outcome::answer(answer, Some(ResponseData::Current(snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::CityList;
    use crate::weather::ForecastPoint;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    /// Provider with fixed temperatures; unknown cities are "not found"
    struct FixedWeather {
        temps: HashMap<String, f64>,
    }

    impl FixedWeather {
        fn new(temps: &[(&str, f64)]) -> Self {
            Self {
                temps: temps.iter().map(|(c, t)| (c.to_string(), *t)).collect(),
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
            let temp = self
                .temps
                .get(city)
                .ok_or_else(|| WeatherError::NotFound(city.to_string()))?;
            Ok(WeatherSnapshot {
                city: city.to_string(),
                temp: *temp,
                feels: Some(*temp),
                humidity: Some(50),
                wind_kmh: Some(8.0),
                condition: "light rain".to_string(),
            })
        }

        async fn forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, WeatherError> {
            let temp = *self
                .temps
                .get(city)
                .ok_or_else(|| WeatherError::NotFound(city.to_string()))?;
            let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
            Ok((0..12)
                .map(|i| ForecastPoint {
                    time: start + chrono::Duration::hours(3 * i),
                    temp: temp + i as f64,
                    humidity: Some(70),
                    wind_kmh: None,
                    condition: "overcast clouds".to_string(),
                })
                .collect())
        }
    }

    fn assistant() -> Assistant {
        Assistant::new(
            Arc::new(CityList::new(["Pune", "Nagpur", "Goa", "Atlantis"])),
            Arc::new(FixedWeather::new(&[("Pune", 30.0), ("Nagpur", 26.8), ("Goa", 29.0)])),
        )
    }

    #[tokio::test]
    async fn test_no_city() {
        let resp = assistant().handle_message("what's the weather like").await;
        assert_eq!(resp.answer, NO_CITY_ANSWER);
        assert!(resp.data.is_none());
        assert!(resp.error.is_none());
        assert_eq!(resp.intent.confidence, 0.6);
        assert_eq!(resp.reasoning_steps.len(), 1);
    }

    #[tokio::test]
    async fn test_current_weather_single() {
        let resp = assistant().handle_message("weather in pune").await;
        assert_eq!(resp.answer, "Pune: 30.0°C, light rain");
        assert!(matches!(resp.data, Some(ResponseData::Current(_))));
        assert_eq!(
            resp.reasoning_steps,
            vec![
                "Detected intent: current_weather, cities: [Pune], confidence: 0.9",
                "Weather fetched successfully for Pune",
            ]
        );
    }

    #[tokio::test]
    async fn test_current_weather_multi() {
        let resp = assistant().handle_message("weather in pune and goa").await;
        assert_eq!(resp.answer, "Pune: 30.0°C, light rain\nGoa: 29.0°C, light rain");
        match resp.data {
            Some(ResponseData::Multi(multi)) => assert_eq!(multi.cities.len(), 2),
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multi_keeps_partial_success() {
        let resp = assistant().handle_message("weather in pune and atlantis").await;
        assert!(resp.error.is_none());
        assert_eq!(resp.answer, "Pune: 30.0°C, light rain");
        assert!(matches!(resp.data, Some(ResponseData::Multi(ref m)) if m.cities.len() == 1));
        assert!(
            resp.reasoning_steps
                .iter()
                .any(|s| s.starts_with("Weather fetch failed for Atlantis"))
        );
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let resp = assistant().handle_message("weather in atlantis").await;
        assert_eq!(resp.answer, "Unable to fetch weather for Atlantis.");
        assert_eq!(resp.error.as_deref(), Some("city not found: Atlantis"));
        assert!(resp.data.is_none());
    }

    #[tokio::test]
    async fn test_forecast() {
        let resp = assistant().handle_message("forecast for goa").await;
        assert_eq!(resp.intent.intent, Intent::Forecast);
        assert_eq!(
            resp.answer,
            "Next 24h in Goa: avg 32.5°C (min 29.0°C, max 36.0°C), mostly overcast clouds."
        );
        match resp.data {
            Some(ResponseData::Forecast(data)) => assert_eq!(data.forecast.points, 8),
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forecast_window_configurable() {
        let resp = assistant()
            .with_forecast_window(4)
            .handle_message("goa tomorrow")
            .await;
        assert!(resp.answer.starts_with("Next 12h in Goa"));
    }

    #[tokio::test]
    async fn test_comparison() {
        let resp = assistant().handle_message("compare pune vs nagpur").await;
        assert_eq!(resp.intent.intent, Intent::Comparison);
        assert!(resp.answer.starts_with("Pune is warmer than Nagpur by 3.2°C."));
        match resp.data {
            Some(ResponseData::Comparison(c)) => {
                assert_eq!(c.city1_weather.city, "Pune");
                assert_eq!(c.city2_weather.city, "Nagpur");
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_comparison_with_one_city() {
        let resp = assistant().handle_message("compare pune").await;
        assert_eq!(resp.intent.intent, Intent::Comparison);
        assert!(resp.reasoning_steps[1].starts_with("Comparison needs two cities"));
        assert_eq!(resp.answer, "Pune: 30.0°C, light rain");
    }

    #[tokio::test]
    async fn test_advice() {
        let resp = assistant().handle_message("should i carry an umbrella in pune").await;
        assert_eq!(resp.intent.intent, Intent::Advice);
        assert!(resp.answer.starts_with("Pune: 30.0°C, light rain\n- Carry an umbrella"));
        assert!(resp.answer.contains("hydrated"));
    }

    #[tokio::test]
    async fn test_request_ids_unique() {
        let a = assistant();
        let first = a.handle_message("weather in pune").await;
        let second = a.handle_message("weather in pune").await;
        assert_ne!(first.request_id, second.request_id);
    }
}
