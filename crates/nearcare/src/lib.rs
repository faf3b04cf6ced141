//! NearCare - healthcare facility search service
//!
//! NearCare answers two questions for a frontend: "which hospitals are near
//! me?" and "which hospitals in this place offer this service?". The first
//! reverse-geocodes the caller's position to a country and ranks that
//! country's facilities by great-circle distance. The second filters by
//! country, state, city and service, and forward-geocodes the place so the
//! client can centre a map on it.
//!
//! ```rust,no_run
//! use nearcare::{ServiceConfig, init_logging, server};
//!
//! # async fn run() -> Result<(), nearcare::error::NearcareError> {
//! let config = ServiceConfig::from_env()?;
//! init_logging(config.log_level.as_str())?;
//! server::serve(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Facility data lives in a single parquet file managed by
//! [`nearcare_data`]; it is filled through the CSV upload endpoint or the
//! `nearcare ingest` command.
use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

pub mod api;
pub mod config;
pub mod error;
pub mod geocoder;
pub mod ingest;
pub mod repository;
pub mod search;
pub mod server;

pub use api::{ApiError, AppState, create_router};
pub use config::{GeocoderConfig, PaginationConfig, ServiceConfig, ServiceConfigBuilder};
pub use geocoder::{Coordinates, GeocodeError, Geocoder, NominatimGeocoder, PlaceQuery};
pub use nearcare_data as data;
pub use repository::{DatasetRepository, FacilityFilter, FacilityRepository, Page};
pub use search::{FilterResponse, NearbyResponse, SearchError, SearchService};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Later calls are no-ops.
pub fn init_logging(level: &str) -> Result<&'static (), error::NearcareError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
