use nearcare_data::GeoPoint;
use serde::Deserialize;

use super::SearchError;
use crate::config::PaginationConfig;
use crate::repository::Page;

/// Query string of a proximity search. Kept as raw text so that missing and
/// malformed values are reported the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// JSON body of a filter search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterBody {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub service: Option<String>,
}

pub fn parse_point(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<GeoPoint, SearchError> {
    let (Some(latitude), Some(longitude)) = (non_blank(latitude), non_blank(longitude)) else {
        return Err(SearchError::bad_request("latitude and longitude required"));
    };

    let invalid = || SearchError::bad_request("Latitude and longitude must be valid coordinates");
    let latitude: f64 = latitude.parse().map_err(|_| invalid())?;
    let longitude: f64 = longitude.parse().map_err(|_| invalid())?;

    let point = GeoPoint::new(latitude, longitude);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(invalid())
    }
}

/// Absent values take the defaults; a limit above the maximum is clamped.
pub fn parse_page(
    page: Option<&str>,
    limit: Option<&str>,
    config: PaginationConfig,
) -> Result<Page, SearchError> {
    let page = match non_blank(page) {
        Some(raw) => positive(raw).ok_or_else(|| {
            SearchError::bad_request("Page must be a positive integer")
        })?,
        None => 1,
    };
    let limit = match non_blank(limit) {
        Some(raw) => positive(raw)
            .ok_or_else(|| SearchError::bad_request("Limit must be a positive integer"))?
            .min(config.max_limit),
        None => config.default_limit,
    };
    Ok(Page::new(page, limit))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn positive(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|v| *v > 0)
}
