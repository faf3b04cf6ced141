use async_trait::async_trait;
use nearcare_data::GeoPoint;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{Coordinates, GeocodeError, Geocoder};
use crate::config::GeocoderConfig;
use crate::error::Result;

/// Client for an OpenStreetMap Nominatim server.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    country: Option<String>,
}

/// Nominatim reports coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl SearchHit {
    fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.lat.trim().parse().ok()?;
        let lon = self.lon.trim().parse().ok()?;
        Some(Coordinates { lat, lon })
    }
}

fn unavailable(e: reqwest::Error) -> GeocodeError {
    GeocodeError::Unavailable(e.to_string())
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(name = "Reverse geocode", skip(self), level = "debug")]
    async fn reverse_geocode(&self, point: GeoPoint) -> std::result::Result<String, GeocodeError> {
        let lat = point.latitude.to_string();
        let lon = point.longitude.to_string();
        let response: ReverseResponse = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("addressdetails", "1"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        let country = response
            .address
            .and_then(|a| a.country)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GeocodeError::CountryNotResolved)?;
        debug!(country, "Reverse geocoding resolved");
        Ok(country)
    }

    async fn search(&self, query: &str) -> std::result::Result<Option<Coordinates>, GeocodeError> {
        let hits: Vec<SearchHit> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        match hits.first() {
            Some(hit) => hit.coordinates().map(Some).ok_or_else(|| {
                GeocodeError::Unavailable(format!(
                    "Unparseable coordinates '{}', '{}'",
                    hit.lat, hit.lon
                ))
            }),
            None => Ok(None),
        }
    }
}
