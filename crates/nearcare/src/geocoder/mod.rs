//! Turning coordinates into a country and place names into coordinates.
//!
//! [`Geocoder`] is the seam the search layer talks to. Implementations only
//! have to answer a single free-text [`Geocoder::search`] and a reverse
//! lookup; the ordered fallback across candidate queries lives here.
mod nominatim;

use async_trait::async_trait;
use nearcare_data::GeoPoint;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use nominatim::NominatimGeocoder;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoding service unavailable: {0}")]
    Unavailable(String),
    #[error("Could not determine country from given coordinates")]
    CountryNotResolved,
}

/// A resolved position, in the shape returned to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A place described by name. Blank parts are dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceQuery {
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
}

impl PlaceQuery {
    pub fn new(country: &str, state: Option<&str>, city: Option<&str>) -> Self {
        Self {
            country: country.trim().to_string(),
            state: non_blank(state),
            city: non_blank(city),
        }
    }

    /// Free-text queries from most to least specific.
    ///
    /// A city is paired with the state when there is one, otherwise with the
    /// country. The bare country is always tried last.
    pub fn candidate_queries(&self) -> Vec<String> {
        let mut candidates = Vec::with_capacity(3);
        let country = self.country.as_str();

        if let Some(city) = &self.city {
            let region = self.state.as_deref().unwrap_or(country);
            candidates.push(join_parts(&[city, region, country]));
        }
        if let Some(state) = &self.state {
            candidates.push(join_parts(&[state, country]));
        }
        if !country.is_empty() {
            candidates.push(country.to_string());
        }
        candidates
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// English country name for the point.
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, GeocodeError>;

    /// Best match for one free-text query, `Ok(None)` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;

    /// Resolve a place, trying each candidate query in turn.
    ///
    /// Lookup failures never propagate: an unresolvable place is `None`.
    async fn forward_geocode(&self, place: &PlaceQuery) -> Option<Coordinates> {
        first_resolved(self, place.candidate_queries()).await
    }
}

/// Evaluate `candidates` in order and stop at the first one that resolves.
pub async fn first_resolved<G>(geocoder: &G, candidates: Vec<String>) -> Option<Coordinates>
where
    G: Geocoder + ?Sized,
{
    for query in candidates {
        match geocoder.search(&query).await {
            Ok(Some(coordinates)) => {
                debug!(query, ?coordinates, "Forward geocoding resolved");
                return Some(coordinates);
            }
            Ok(None) => debug!(query, "No forward geocoding match"),
            Err(e) => warn!(query, error = %e, "Forward geocoding failed, trying next candidate"),
        }
    }
    None
}
