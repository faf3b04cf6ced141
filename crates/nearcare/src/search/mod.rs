//! Search orchestration: geocoding plus repository queries plus pagination.
mod params;

use std::sync::Arc;

use nearcare_data::{DataError, Facility};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::PaginationConfig;
use crate::geocoder::{Coordinates, GeocodeError, Geocoder, PlaceQuery};
use crate::repository::{FacilityFilter, FacilityRepository, Page};

pub use params::{FilterBody, NearbyParams, PageParams};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{message}")]
    BadRequest {
        message: String,
        detail: Option<String>,
    },
    #[error("Facility query failed: {0}")]
    Repository(#[from] DataError),
}

impl SearchError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            detail: None,
        }
    }
}

impl From<GeocodeError> for SearchError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::CountryNotResolved => Self::bad_request(e.to_string()),
            GeocodeError::Unavailable(detail) => Self::BadRequest {
                message: "Unable to detect country from coordinates".to_string(),
                detail: Some(detail),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub country: String,
    pub total_hospitals: u64,
    pub page: u32,
    pub total_pages: u64,
    pub hospitals: Vec<Facility>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
    pub filters: FacilityFilter,
    pub coordinates: Option<Coordinates>,
    pub total_hospitals: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub hospitals: Vec<Facility>,
}

pub struct SearchService {
    geocoder: Arc<dyn Geocoder>,
    repository: Arc<dyn FacilityRepository>,
    pagination: PaginationConfig,
}

impl SearchService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        repository: Arc<dyn FacilityRepository>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            geocoder,
            repository,
            pagination,
        }
    }

    /// Facilities in the country containing the given point, nearest first.
    ///
    /// Input is validated before anything is called, and nothing is queried
    /// if the country cannot be resolved.
    #[instrument(name = "Nearby search", skip(self), level = "info")]
    pub async fn nearby(&self, params: &NearbyParams) -> Result<NearbyResponse, SearchError> {
        let point = params::parse_point(params.latitude.as_deref(), params.longitude.as_deref())?;
        let page = params::parse_page(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.pagination,
        )?;

        let country = self.geocoder.reverse_geocode(point).await.map_err(|e| {
            warn!(error = %e, "Reverse geocoding failed");
            SearchError::from(e)
        })?;

        let filter = FacilityFilter::for_country(&country);
        let total = self.repository.count(&filter)?;
        let hospitals = self.repository.nearest(point, &filter, page)?;
        info!(country, total, returned = hospitals.len(), "Nearby search complete");

        let message = hospitals
            .is_empty()
            .then(|| format!("No hospitals found in {country} for this page"));
        Ok(NearbyResponse {
            message,
            country,
            total_hospitals: total,
            page: page.page,
            total_pages: page.total_pages(total),
            hospitals,
        })
    }

    /// Facilities matching the attribute filter, in insertion order, plus the
    /// coordinates of the searched place when they can be resolved.
    #[instrument(name = "Filter search", skip(self), level = "info")]
    pub async fn search(
        &self,
        body: &FilterBody,
        params: &PageParams,
    ) -> Result<FilterResponse, SearchError> {
        let country = body
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SearchError::bad_request("Country is required"))?;
        let page = params::parse_page(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.pagination,
        )?;

        let filter = FacilityFilter::for_country(country)
            .with_state(body.state.as_deref())
            .with_city(body.city.as_deref())
            .with_service(body.service.as_deref());
        let total = self.repository.count(&filter)?;
        let hospitals = self.repository.find(&filter, page)?;

        let place = PlaceQuery::new(country, body.state.as_deref(), body.city.as_deref());
        let coordinates = self.geocoder.forward_geocode(&place).await;
        info!(
            total,
            returned = hospitals.len(),
            resolved = coordinates.is_some(),
            "Filter search complete"
        );

        Ok(FilterResponse {
            filters: filter,
            coordinates,
            total_hospitals: total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(total),
            hospitals,
        })
    }
}
