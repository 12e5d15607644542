//! Candidate city extraction
//!
//! Each strategy is an independent pure function over the raw message that
//! returns raw substrings suspected of naming a city. Strategies overlap;
//! noise is removed later by normalization and validation.

use regex::Regex;
use std::sync::LazyLock;

/// One word of a place name: a letter, then letters, digits, hyphens,
/// apostrophes or periods ("st.", "winston-salem", "o'fallon").
const WORD: &str = r"[A-Za-z][\w\-'.]*";

/// Preposition followed by 1–4 words: "in pune", "for new york city".
static PREPOSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:in|at|for|of|near|around|from|to)\s+({WORD}(?:\s+{WORD}){{0,3}})"
    ))
    .unwrap()
});

/// Two word groups joined by a connector: "pune and nagpur", "delhi vs mumbai".
static CONNECTOR_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({WORD}(?:\s+{WORD}){{0,3}})\s*(?:,|\band\b|\bor\b|\bvs\b)\s*({WORD}(?:\s+{WORD}){{0,3}})"
    ))
    .unwrap()
});

/// Runs of capitalized words in the original casing: "Pune", "New York".
static CAPITALIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+){0,3})\b").unwrap());

static CONNECTOR_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),|\b(?:and|or|vs)\b").unwrap());

static LAST_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'\-]+").unwrap());

/// Extract raw city candidates from a message.
///
/// Strategies run in a fixed order and append to one list; duplicates are
/// removed afterwards with the first occurrence winning, so earlier
/// strategies keep priority. The last-token fallback only runs when nothing
/// else matched. Empty input yields an empty list.
pub fn extract_candidates(message: &str) -> Vec<String> {
    let text = message.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut candidates = preposition_candidates(text);
    candidates.extend(connector_pair_candidates(text));
    candidates.extend(capitalized_candidates(text));

    if candidates.is_empty() {
        candidates.extend(last_token_candidate(text));
    }

    dedup_first_wins(candidates)
}

/// Word groups following a preposition, split on inner connectors so
/// "weather of pune and nagpur" yields both cities. Matches never overlap:
/// a preposition inside a captured group ("port of spain") is part of it.
pub fn preposition_candidates(text: &str) -> Vec<String> {
    PREPOSITION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|group| split_on_connectors(group.as_str()))
        .collect()
}

/// Both sides of "X and Y", "X, Y", "X or Y" and "X vs Y", including pairs
/// with no preposition in front ("compare pune and nagpur").
pub fn connector_pair_candidates(text: &str) -> Vec<String> {
    CONNECTOR_PAIR_RE
        .captures_iter(text)
        .flat_map(|caps| {
            let left = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let right = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let mut sides = split_on_connectors(left);
            sides.extend(split_on_connectors(right));
            sides
        })
        .collect()
}

/// Capitalized word runs, for messages like "Pune weather" that carry no
/// preposition at all.
pub fn capitalized_candidates(text: &str) -> Vec<String> {
    CAPITALIZED_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Last resort: the final word-like token of the message.
pub fn last_token_candidate(text: &str) -> Option<String> {
    LAST_TOKEN_RE
        .find_iter(text)
        .last()
        .map(|m| m.as_str().to_string())
}

fn split_on_connectors(group: &str) -> Vec<String> {
    CONNECTOR_SPLIT_RE
        .split(group)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup_first_wins(candidates: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.contains(&candidate) {
            seen.push(candidate);
        }
    }
    seen
}
