//! Queries over the facility collection.
mod proximity;

use std::sync::Arc;

use nearcare_data::schema::{CITY, COUNTRY, DISTANCE, SERVICES, STATE};
use nearcare_data::{DataError, Facility, FacilityDataset, GeoPoint};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

pub use proximity::{EARTH_RADIUS_METRES, haversine_distance};

pub type RepositoryResult<T> = std::result::Result<T, DataError>;

/// One page of results. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

/// Attribute filter. Values are stored trimmed and lowercased.
///
/// Country, state and city match exactly ignoring case; `service` matches
/// anywhere inside the services text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacilityFilter {
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value.map(normalize).filter(|v| !v.is_empty())
}

impl FacilityFilter {
    pub fn for_country(country: &str) -> Self {
        Self {
            country: normalize(country),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: Option<&str>) -> Self {
        self.state = normalize_optional(state);
        self
    }

    pub fn with_city(mut self, city: Option<&str>) -> Self {
        self.city = normalize_optional(city);
        self
    }

    pub fn with_service(mut self, service: Option<&str>) -> Self {
        self.service = normalize_optional(service);
        self
    }

    fn predicate(&self) -> Expr {
        let equals = |column: &str, value: &str| {
            col(column)
                .str()
                .to_lowercase()
                .eq(lit(value.to_string()))
        };

        let mut predicate = equals(COUNTRY, &self.country);
        if let Some(state) = &self.state {
            predicate = predicate.and(equals(STATE, state));
        }
        if let Some(city) = &self.city {
            predicate = predicate.and(equals(CITY, city));
        }
        if let Some(service) = &self.service {
            predicate = predicate.and(
                col(SERVICES)
                    .str()
                    .to_lowercase()
                    .str()
                    .contains_literal(lit(service.clone())),
            );
        }
        predicate
    }
}

/// Read access to the facility collection.
///
/// Results are in insertion order unless stated otherwise.
pub trait FacilityRepository: Send + Sync {
    fn count(&self, filter: &FacilityFilter) -> RepositoryResult<u64>;

    fn find(&self, filter: &FacilityFilter, page: Page) -> RepositoryResult<Vec<Facility>>;

    /// Matching facilities by ascending distance from `point`, with `distance` set.
    fn nearest(
        &self,
        point: GeoPoint,
        filter: &FacilityFilter,
        page: Page,
    ) -> RepositoryResult<Vec<Facility>>;
}

/// [`FacilityRepository`] evaluated as lazy polars queries over a [`FacilityDataset`].
#[derive(Clone)]
pub struct DatasetRepository {
    dataset: Arc<FacilityDataset>,
}

impl DatasetRepository {
    pub fn new(dataset: Arc<FacilityDataset>) -> Self {
        Self { dataset }
    }

    fn filtered(&self, filter: &FacilityFilter) -> RepositoryResult<LazyFrame> {
        Ok(self.dataset.snapshot()?.lazy().filter(filter.predicate()))
    }
}

fn slice(lf: LazyFrame, page: Page) -> LazyFrame {
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    lf.slice(offset, page.limit as IdxSize)
}

impl FacilityRepository for DatasetRepository {
    #[instrument(name = "Count facilities", skip(self), level = "debug")]
    fn count(&self, filter: &FacilityFilter) -> RepositoryResult<u64> {
        let count = self
            .filtered(filter)?
            .select([len().alias("count")])
            .collect()?
            .column("count")?
            .u32()?
            .get(0)
            .unwrap_or(0);
        debug!(count, "Counted facilities");
        Ok(u64::from(count))
    }

    #[instrument(name = "Find facilities", skip(self), level = "debug")]
    fn find(&self, filter: &FacilityFilter, page: Page) -> RepositoryResult<Vec<Facility>> {
        let df = slice(self.filtered(filter)?, page).collect()?;
        Facility::from_df(&df)
    }

    #[instrument(name = "Nearest facilities", skip(self), level = "debug")]
    fn nearest(
        &self,
        point: GeoPoint,
        filter: &FacilityFilter,
        page: Page,
    ) -> RepositoryResult<Vec<Facility>> {
        let lf = self
            .filtered(filter)?
            .with_column(haversine_distance(point).alias(DISTANCE))
            .sort(
                [DISTANCE],
                SortMultipleOptions::default().with_maintain_order(true),
            );
        let df = slice(lf, page).collect()?;
        Facility::from_df(&df)
    }
}

#[cfg(test)]
mod tests {
    use nearcare_data::test_data::sample_facility_frame;

    use super::*;

    fn repository() -> DatasetRepository {
        let dataset = FacilityDataset::in_memory(sample_facility_frame()).unwrap();
        DatasetRepository::new(Arc::new(dataset))
    }

    fn ids(facilities: &[Facility]) -> Vec<u64> {
        facilities.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_page_arithmetic() {
        let page = Page::new(3, 20);
        assert_eq!(page.offset(), 40);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(20), 1);
        assert_eq!(page.total_pages(41), 3);
        assert_eq!(Page::new(0, 0), Page::new(1, 1));
    }

    #[test]
    fn test_filter_normalizes_inputs() {
        let filter = FacilityFilter::for_country("  FRANCE ")
            .with_state(Some(" "))
            .with_city(Some("Paris"))
            .with_service(None);
        assert_eq!(filter.country, "france");
        assert_eq!(filter.state, None);
        assert_eq!(filter.city.as_deref(), Some("paris"));
    }

    #[test]
    fn test_country_match_ignores_case() {
        let repo = repository();
        for country in ["FRANCE", "France", "france"] {
            let filter = FacilityFilter::for_country(country);
            assert_eq!(repo.count(&filter).unwrap(), 2);
            assert_eq!(ids(&repo.find(&filter, Page::new(1, 20)).unwrap()), vec![4, 5]);
        }
        // Stored values differ in case too.
        let nigeria = FacilityFilter::for_country("Nigeria");
        assert_eq!(repo.count(&nigeria).unwrap(), 3);
    }

    #[test]
    fn test_service_substring_match() {
        let repo = repository();
        let filter = FacilityFilter::for_country("nigeria").with_service(Some("PEDIA"));
        let found = repo.find(&filter, Page::new(1, 20)).unwrap();
        assert_eq!(ids(&found), vec![1]);
        assert_eq!(found[0].services, "Emergency, Pediatrics, Surgery");
        assert_eq!(found[0].distance, None);
    }

    #[test]
    fn test_state_and_city_filters() {
        let repo = repository();
        let filter = FacilityFilter::for_country("nigeria").with_city(Some("ikeja"));
        assert_eq!(ids(&repo.find(&filter, Page::new(1, 20)).unwrap()), vec![2]);

        let filter = FacilityFilter::for_country("ghana").with_city(Some("Lagos"));
        assert_eq!(repo.count(&filter).unwrap(), 0);
        assert!(repo.find(&filter, Page::new(1, 20)).unwrap().is_empty());
    }

    #[test]
    fn test_find_paginates_in_insertion_order() {
        let repo = repository();
        let filter = FacilityFilter::for_country("nigeria");
        assert_eq!(ids(&repo.find(&filter, Page::new(1, 2)).unwrap()), vec![1, 2]);
        assert_eq!(ids(&repo.find(&filter, Page::new(2, 2)).unwrap()), vec![3]);
        assert!(repo.find(&filter, Page::new(3, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_nearest_orders_by_distance_within_country() {
        let repo = repository();
        // Ikeja, closer to facility 2 than to facility 1.
        let point = GeoPoint::new(6.6018, 3.3515);
        let filter = FacilityFilter::for_country("Nigeria");

        let found = repo.nearest(point, &filter, Page::new(1, 20)).unwrap();
        assert_eq!(ids(&found), vec![2, 1, 3]);
        assert!(found.iter().all(|f| f.country.eq_ignore_ascii_case("nigeria")));

        let distances: Vec<f64> = found.iter().map(|f| f.distance.unwrap()).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert!(distances[0] < 1_000.0);
    }

    #[test]
    fn test_nearest_pages() {
        let repo = repository();
        let point = GeoPoint::new(6.6018, 3.3515);
        let filter = FacilityFilter::for_country("nigeria");

        let second = repo.nearest(point, &filter, Page::new(2, 2)).unwrap();
        assert_eq!(ids(&second), vec![3]);
        assert!(repo.nearest(point, &filter, Page::new(5, 2)).unwrap().is_empty());
    }
}
