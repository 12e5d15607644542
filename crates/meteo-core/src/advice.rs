//! Rule-based outdoor advice from current conditions

use crate::weather::WeatherSnapshot;

const COMFORTABLE: &str = "Conditions look comfortable for being outdoors.";

/// Tips for the given conditions, in fixed rule order.
///
/// Always returns at least one line.
pub fn advise(weather: &WeatherSnapshot) -> Vec<String> {
    let condition = weather.condition.to_lowercase();
    let mut tips = Vec::new();

    if ["rain", "drizzle", "thunderstorm"]
        .iter()
        .any(|w| condition.contains(w))
    {
        tips.push("Carry an umbrella, rain is expected.".to_string());
    }
    if condition.contains("snow") {
        tips.push("Wear waterproof boots, it is snowing.".to_string());
    }

    if weather.temp >= 35.0 {
        tips.push("Extreme heat: avoid outdoor activity around midday.".to_string());
    } else if weather.temp >= 30.0 {
        tips.push("It is hot: stay hydrated and wear light clothing.".to_string());
    } else if weather.temp <= 10.0 {
        tips.push("It is cold: wear a warm jacket.".to_string());
    }

    if weather.wind_kmh.is_some_and(|w| w >= 30.0) {
        tips.push("It is windy, secure loose items.".to_string());
    }
    if weather.humidity.is_some_and(|h| h >= 85) {
        tips.push("Very humid, expect it to feel muggy.".to_string());
    }

    if tips.is_empty() {
        tips.push(COMFORTABLE.to_string());
    }
    tips
}
