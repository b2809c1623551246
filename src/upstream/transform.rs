//! Response transforms applied to successful upstream bodies.
//!
//! A transform turns the raw upstream body into the payload that gets cached
//! and served. It runs exactly once per successful fetch and is swapped per
//! upstream without touching the coordinator.

use serde::{Deserialize, Serialize};

use crate::{HuginnError, Result};

/// Pluggable `raw bytes -> normalized bytes` conversion.
pub trait ResponseTransform: Send + Sync {
    fn transform(&self, raw: &[u8]) -> Result<Vec<u8>>;
}

impl<F> ResponseTransform for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync,
{
    fn transform(&self, raw: &[u8]) -> Result<Vec<u8>> {
        self(raw)
    }
}

/// Passes the body through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ResponseTransform for Identity {
    fn transform(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }
}

/// Normalizes a places autocomplete response.
///
/// Input is a JSON array of `{code, type, country_name, city_name, name}`
/// objects; output is an array of `{slug, subtitle, title}`. The subtitle is
/// the country for a city and the city for an airport.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacesTransform;

#[derive(Deserialize)]
struct Place {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    city_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
struct Suggestion {
    slug: String,
    subtitle: String,
    title: String,
}

impl From<Place> for Suggestion {
    fn from(place: Place) -> Self {
        // JSON nulls map to empty strings.
        let subtitle = match place.kind.as_deref() {
            Some("city") => place.country_name,
            Some("airport") => place.city_name,
            _ => None,
        };
        Suggestion {
            slug: place.code.unwrap_or_default(),
            subtitle: subtitle.unwrap_or_default(),
            title: place.name.unwrap_or_default(),
        }
    }
}

impl ResponseTransform for PlacesTransform {
    fn transform(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let places: Vec<Place> = serde_json::from_slice(raw)
            .map_err(|e| HuginnError::InvalidPayload(e.to_string()))?;
        let suggestions: Vec<Suggestion> = places.into_iter().map(Suggestion::from).collect();
        Ok(serde_json::to_vec(&suggestions)?)
    }
}
