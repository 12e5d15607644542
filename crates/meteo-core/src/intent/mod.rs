//! Intent & city understanding
//!
//! Turns a free-text weather question into a structured [`IntentResult`]:
//! - candidate city substrings are pulled out with overlapping regex heuristics
//! - each candidate is normalized and checked against a [`CityValidator`]
//! - if nothing validates, every word of the message is tried on its own
//! - the message is classified with fixed-priority keyword sets
//!
//! Classification never fails. Lookup misses and unparseable input surface as
//! an empty city list with lowered confidence.

mod extract;
mod normalize;

pub use extract::{
    capitalized_candidates, connector_pair_candidates, extract_candidates,
    last_token_candidate, preposition_candidates,
};
pub use normalize::{BLACKLIST, LEADING_NOISE, TRAILING_NOISE, is_blacklisted, normalize_city};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::validator::CityValidator;

/// Confidence when at least one city was resolved
pub const CONFIDENCE_WITH_CITY: f64 = 0.9;
/// Confidence when no city was resolved
pub const CONFIDENCE_WITHOUT_CITY: f64 = 0.6;

/// Shortest word tried by the per-word fallback
const FALLBACK_MIN_WORD_LEN: usize = 3;

const COMPARISON_KEYWORDS: &[&str] = &["compare", "vs", "difference"];
const FORECAST_KEYWORDS: &[&str] = &[
    "tomorrow", "next", "forecast", "weekend", "later", "future", "evening", "tonight",
];
const ADVICE_KEYWORDS: &[&str] = &["should i", "can i", "advice", "wear", "run", "travel"];
const CURRENT_WEATHER_KEYWORDS: &[&str] =
    &["weather", "temperature", "forecast", "climate", "temp"];

static FALLBACK_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\p{{L}}{{{FALLBACK_MIN_WORD_LEN},}}")).unwrap());

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CurrentWeather,
    Forecast,
    Comparison,
    Advice,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentWeather => "current_weather",
            Self::Forecast => "forecast",
            Self::Comparison => "comparison",
            Self::Advice => "advice",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured understanding of one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Validated city names, first-discovered order; no case-insensitive
    /// duplicates and no name that is a whole-word part of another
    pub cities: Vec<String>,
    /// Coarse signal, not a probability: 0.9 with cities, 0.6 without
    pub confidence: f64,
    pub is_multi_city: bool,
}

impl IntentResult {
    /// Build a result, deriving confidence and the multi-city flag from `cities`.
    pub fn new(intent: Intent, cities: Vec<String>) -> Self {
        let confidence = if cities.is_empty() {
            CONFIDENCE_WITHOUT_CITY
        } else {
            CONFIDENCE_WITH_CITY
        };
        Self {
            intent,
            is_multi_city: cities.len() >= 2,
            cities,
            confidence,
        }
    }
}

/// Understand a message: resolve the cities it mentions, then classify it.
///
/// Validator calls are made one at a time, in candidate order.
pub async fn classify(message: &str, validator: &dyn CityValidator) -> IntentResult {
    let cities = resolve_cities(message, validator).await;
    let intent = classify_intent(message, cities.len());
    debug!(
        "Classified message as {} with cities {:?}",
        intent, cities
    );
    IntentResult::new(intent, cities)
}

/// Resolve the validated cities mentioned in a message.
///
/// Normalized candidates are tried first. Only when none of them validates
/// are the message's individual words looked up instead.
pub async fn resolve_cities(message: &str, validator: &dyn CityValidator) -> Vec<String> {
    let mut cities = Vec::new();

    for name in normalized_candidates(message) {
        match validator.validate(&name).await {
            Some(canonical) => push_unique(&mut cities, canonical),
            None => debug!("Candidate {:?} is not a known city", name),
        }
    }

    if cities.is_empty() {
        let words = fallback_words(message);
        if !words.is_empty() {
            debug!(
                "No candidate validated, trying {} individual words",
                words.len()
            );
        }
        for word in words {
            if let Some(canonical) = validator.validate(&word).await {
                push_unique(&mut cities, canonical);
            }
        }
    }

    cities
}

/// Candidates after normalization, with empty and blacklisted names removed
/// and duplicates collapsed, in extraction order.
pub fn normalized_candidates(message: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in extract_candidates(message) {
        let name = normalize_city(&raw);
        if name.is_empty() || is_blacklisted(&name) {
            debug!("Dropping candidate {:?}", raw);
            continue;
        }
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Lowercased alphabetic words of at least three letters, deduplicated in
/// order of appearance.
pub fn fallback_words(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut words: Vec<String> = Vec::new();
    for m in FALLBACK_WORD_RE.find_iter(&lower) {
        let word = m.as_str().to_string();
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Keyword classification, first matching rule wins:
/// comparison, forecast, advice, current weather, unknown.
///
/// `forecast` is checked before current weather, so a message mentioning
/// "forecast" is never classified as current weather.
pub fn classify_intent(message: &str, city_count: usize) -> Intent {
    let text = message.to_lowercase();
    let mentions_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if mentions_any(COMPARISON_KEYWORDS) || (city_count >= 2 && text.contains("which")) {
        Intent::Comparison
    } else if mentions_any(FORECAST_KEYWORDS) {
        Intent::Forecast
    } else if mentions_any(ADVICE_KEYWORDS) {
        Intent::Advice
    } else if mentions_any(CURRENT_WEATHER_KEYWORDS) {
        Intent::CurrentWeather
    } else {
        Intent::Unknown
    }
}

/// Add a validated city unless it repeats one already found, either exactly
/// (case-insensitive) or as a whole-word part of a longer name ("Spain" after
/// "Port of Spain"). A longer name replaces the parts of it found earlier.
fn push_unique(cities: &mut Vec<String>, name: String) {
    let words = lowercase_words(&name);
    if cities
        .iter()
        .any(|c| contains_words(&lowercase_words(c), &words))
    {
        debug!("City {:?} already covered", name);
        return;
    }

    match cities
        .iter()
        .position(|c| contains_words(&words, &lowercase_words(c)))
    {
        Some(first) => {
            cities[first] = name;
            let mut index = 0;
            cities.retain(|c| {
                let keep = index <= first || !contains_words(&words, &lowercase_words(c));
                index += 1;
                keep
            });
        }
        None => cities.push(name),
    }
}

fn lowercase_words(name: &str) -> Vec<String> {
    name.split_whitespace().map(str::to_lowercase).collect()
}

/// Whether `needle` occurs in `haystack` as a contiguous run of words
fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::CityList;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canonicalizing validator that records every lookup
    struct RecordingValidator {
        known: CityList,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingValidator {
        fn new(cities: &[&str]) -> Self {
            Self {
                known: CityList::new(cities.iter().copied()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CityValidator for RecordingValidator {
        async fn validate(&self, candidate: &str) -> Option<String> {
            self.calls.lock().unwrap().push(candidate.to_string());
            self.known.lookup(candidate)
        }
    }

    fn cities() -> RecordingValidator {
        RecordingValidator::new(&["Pune", "Nagpur", "Mumbai", "New York", "Delhi"])
    }

    #[tokio::test]
    async fn test_current_weather_single_city() {
        let result = classify("what is the weather in pune", &cities()).await;
        assert_eq!(result.intent, Intent::CurrentWeather);
        assert_eq!(result.cities, vec!["Pune"]);
        assert_eq!(result.confidence, CONFIDENCE_WITH_CITY);
        assert!(!result.is_multi_city);
    }

    #[tokio::test]
    async fn test_forecast_beats_current_weather() {
        let result = classify("forecast weather for Pune", &cities()).await;
        assert_eq!(result.intent, Intent::Forecast);
        assert_eq!(result.cities, vec!["Pune"]);
    }

    #[tokio::test]
    async fn test_comparison_by_keyword() {
        let result = classify("compare pune and nagpur", &cities()).await;
        assert_eq!(result.intent, Intent::Comparison);
        assert_eq!(result.cities, vec!["Pune", "Nagpur"]);
        assert!(result.is_multi_city);
    }

    #[tokio::test]
    async fn test_comparison_by_which_and_two_cities() {
        let result = classify("which is hotter, Delhi or Mumbai?", &cities()).await;
        assert_eq!(result.cities, vec!["Delhi", "Mumbai"]);
        assert_eq!(result.intent, Intent::Comparison);
    }

    #[tokio::test]
    async fn test_which_with_one_city_is_not_comparison() {
        let result = classify("which jacket for Delhi", &cities()).await;
        assert_eq!(result.cities, vec!["Delhi"]);
        assert_eq!(result.intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn test_duplicate_mentions_collapse() {
        let result = classify("Pune, pune, PUNE weather", &cities()).await;
        assert_eq!(result.cities, vec!["Pune"]);
    }

    #[tokio::test]
    async fn test_gibberish_prefix_resolved_by_last_token() {
        let validator = cities();
        let result = classify("xyz123 pune", &validator).await;
        assert_eq!(result.cities, vec!["Pune"]);
        assert_eq!(result.confidence, CONFIDENCE_WITH_CITY);
        // the last-token candidate validates, so no per-word lookups follow
        assert_eq!(validator.calls(), vec!["Pune"]);
    }

    #[tokio::test]
    async fn test_empty_normalized_candidate_never_looked_up() {
        let validator = cities();
        let result = classify("compare the weather and pune", &validator).await;
        assert_eq!(result.cities, vec!["Pune"]);
        assert_eq!(result.intent, Intent::Comparison);
        assert!(!result.is_multi_city);

        let calls = validator.calls();
        assert!(calls.iter().all(|c| !c.is_empty()));
        assert_eq!(calls, vec!["Pune"]);
        assert_eq!(
            normalized_candidates("compare the weather and pune"),
            vec!["Pune"]
        );
    }

    #[tokio::test]
    async fn test_city_containing_preposition_counted_once() {
        let validator =
            RecordingValidator::new(&["Port of Spain", "Spain", "Isle of Man", "Man"]);

        let result = classify("which is the weather in Port of Spain", &validator).await;
        assert_eq!(result.cities, vec!["Port of Spain"]);
        assert_eq!(result.intent, Intent::CurrentWeather);
        assert!(!result.is_multi_city);

        let result = classify("weather in Isle of Man", &validator).await;
        assert_eq!(result.cities, vec!["Isle of Man"]);
        assert!(!result.is_multi_city);

        let result = classify("weather in isle of man", &validator).await;
        assert_eq!(result.cities, vec!["Isle of Man"]);
    }

    #[test]
    fn test_push_unique_longer_name_absorbs_parts() {
        let mut cities = vec!["Spain".to_string(), "Pune".to_string()];
        push_unique(&mut cities, "Port of Spain".to_string());
        assert_eq!(cities, vec!["Port of Spain", "Pune"]);

        push_unique(&mut cities, "spain".to_string());
        push_unique(&mut cities, "PUNE".to_string());
        assert_eq!(cities, vec!["Port of Spain", "Pune"]);

        // containment is by whole words, not by substring
        push_unique(&mut cities, "Spainville".to_string());
        assert_eq!(cities, vec!["Port of Spain", "Pune", "Spainville"]);
    }

    #[tokio::test]
    async fn test_fallback_recovers_city_from_word_soup() {
        let validator = cities();
        let result = classify("temperature around delhi-ish region please", &validator).await;
        assert_eq!(result.cities, vec!["Delhi"]);
        assert_eq!(validator.calls()[0], "Delhi-ish Region Please");
    }

    #[tokio::test]
    async fn test_fallback_after_failed_primary_candidate() {
        let validator = cities();
        let result = classify("weather in pune tomorrow please", &validator).await;
        assert_eq!(result.cities, vec!["Pune"]);
        assert_eq!(result.intent, Intent::Forecast);
        let calls = validator.calls();
        assert_eq!(calls[0], "Pune Tomorrow Please");
        assert!(calls.contains(&"pune".to_string()));
    }

    #[tokio::test]
    async fn test_fallback_not_used_when_primary_validates() {
        let validator = cities();
        classify("weather in mumbai", &validator).await;
        assert_eq!(validator.calls(), vec!["Mumbai"]);
    }

    #[tokio::test]
    async fn test_blacklisted_candidates_skip_lookup() {
        let validator = cities();
        classify("What weather in Delhi", &validator).await;
        let calls = validator.calls();
        assert!(!calls.contains(&"What".to_string()));
        assert_eq!(calls, vec!["Delhi"]);
    }

    #[tokio::test]
    async fn test_multi_word_city() {
        let result = classify("forecast for new york", &cities()).await;
        assert_eq!(result.cities, vec!["New York"]);
    }

    #[tokio::test]
    async fn test_preposition_connector_split() {
        let result = classify("temperature of pune and nagpur", &cities()).await;
        assert_eq!(result.cities, vec!["Pune", "Nagpur"]);
        assert_eq!(result.intent, Intent::CurrentWeather);
    }

    #[tokio::test]
    async fn test_degenerate_inputs_are_well_formed() {
        for message in ["", "   ", "?!?!", "asdf qwerty zxcv", "...,,,"] {
            let result = classify(message, &cities()).await;
            assert!(result.cities.is_empty(), "{:?}", message);
            assert_eq!(result.confidence, CONFIDENCE_WITHOUT_CITY);
            assert_eq!(result.intent, Intent::Unknown);
        }
    }

    #[tokio::test]
    async fn test_confidence_only_two_values() {
        for message in [
            "weather in pune",
            "hello there",
            "compare delhi vs mumbai",
            "should i run tomorrow",
        ] {
            let result = classify(message, &cities()).await;
            let expected = if result.cities.is_empty() {
                CONFIDENCE_WITHOUT_CITY
            } else {
                CONFIDENCE_WITH_CITY
            };
            assert_eq!(result.confidence, expected);
        }
    }

    #[test]
    fn test_classify_intent_priority() {
        assert_eq!(classify_intent("compare tomorrow", 0), Intent::Comparison);
        assert_eq!(classify_intent("what's the difference", 0), Intent::Comparison);
        assert_eq!(classify_intent("forecast for the weekend", 1), Intent::Forecast);
        assert_eq!(classify_intent("weather tonight", 1), Intent::Forecast);
        assert_eq!(classify_intent("should I carry an umbrella", 1), Intent::Advice);
        assert_eq!(classify_intent("what should i wear", 1), Intent::Advice);
        assert_eq!(classify_intent("can I travel tomorrow", 1), Intent::Forecast);
        assert_eq!(classify_intent("current temp please", 1), Intent::CurrentWeather);
        assert_eq!(classify_intent("Climate of Goa", 1), Intent::CurrentWeather);
        assert_eq!(classify_intent("hello", 0), Intent::Unknown);
    }

    #[test]
    fn test_classify_intent_which_needs_two_cities() {
        assert_eq!(classify_intent("which is warmer", 2), Intent::Comparison);
        assert_eq!(classify_intent("which is warmer", 1), Intent::Unknown);
    }

    #[test]
    fn test_intent_serialization() {
        let result = IntentResult::new(
            Intent::CurrentWeather,
            vec!["Pune".to_string(), "Goa".to_string()],
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["intent"], "current_weather");
        assert_eq!(json["is_multi_city"], true);
        assert_eq!(json["confidence"], 0.9);
        assert_eq!(Intent::Advice.to_string(), "advice");
    }

    #[test]
    fn test_normalized_candidates_drop_noise_and_duplicates() {
        let names = normalized_candidates("Compare Pune and Nagpur weather");
        assert_eq!(names, vec!["Pune", "Nagpur"]);
    }

    #[test]
    fn test_fallback_words() {
        assert_eq!(
            fallback_words("Is it hot in Pune? pune!"),
            vec!["hot", "pune"]
        );
        assert_eq!(fallback_words("xyz123 pune"), vec!["xyz", "pune"]);
        assert!(fallback_words("a to be").is_empty());
    }
}
