//! City validation seam
//!
//! A validator confirms that a normalized candidate names a real city and
//! returns its canonical display name. Implementations must never fail:
//! network errors, unexpected payloads and empty results all mean "not found".

use async_trait::async_trait;
use std::collections::HashMap;

/// Confirms and canonicalizes city names
#[async_trait]
pub trait CityValidator: Send + Sync {
    /// Canonical name for `candidate`, or `None` if it is not a known city
    async fn validate(&self, candidate: &str) -> Option<String>;
}

/// In-memory list of known cities, matched case-insensitively.
///
/// Used when geocoding is disabled and as a deterministic stand-in for the
/// network lookup.
#[derive(Debug, Clone, Default)]
pub struct CityList {
    by_key: HashMap<String, String>,
}

impl CityList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by_key = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| (name.trim().to_lowercase(), name.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { by_key }
    }

    pub fn lookup(&self, candidate: &str) -> Option<String> {
        self.by_key.get(&candidate.trim().to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[async_trait]
impl CityValidator for CityList {
    async fn validate(&self, candidate: &str) -> Option<String> {
        self.lookup(candidate)
    }
}
