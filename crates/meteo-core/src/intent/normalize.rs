//! Candidate normalization: punctuation stripping, noise-word removal and
//! title-casing.

/// Words that leak into the front of a candidate from the surrounding
/// sentence ("compare pune", "the weather of delhi").
pub const LEADING_NOISE: &[&str] = &[
    "compare", "vs", "versus", "and", "or", "than", "to", "from", "is", "the", "of", "which",
    "city", "weather",
];

/// Words that leak into the end of a candidate ("mumbai weather", "goa today").
pub const TRAILING_NOISE: &[&str] = &[
    "weather",
    "today",
    "now",
    "temperature",
    "forecast",
    "climate",
];

/// Normalized names that are never cities. Checked before any validator
/// lookup.
pub const BLACKLIST: &[&str] = &[
    "What", "Weather", "Can", "Should", "Tell", "Compare", "Is", "The", "Of", "Vs", "And", "Or",
];

/// Normalize a raw candidate into a title-cased city name.
///
/// Returns an empty string when nothing is left after cleaning; callers must
/// discard it. Normalizing an already-normalized name returns it unchanged.
pub fn normalize_city(raw: &str) -> String {
    let mut tokens: Vec<&str> = raw
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphabetic()))
        .filter(|t| !t.is_empty())
        .collect();

    let leading = tokens
        .iter()
        .position(|t| !is_noise(LEADING_NOISE, t))
        .unwrap_or(tokens.len());
    tokens.drain(..leading);

    while tokens.last().is_some_and(|t| is_noise(TRAILING_NOISE, t)) {
        tokens.pop();
    }

    tokens
        .into_iter()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a normalized name is a known non-city word.
pub fn is_blacklisted(name: &str) -> bool {
    BLACKLIST.contains(&name)
}

fn is_noise(set: &[&str], token: &str) -> bool {
    set.iter().any(|w| w.eq_ignore_ascii_case(token))
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
