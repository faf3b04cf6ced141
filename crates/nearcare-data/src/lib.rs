//! Facility data for NearCare.
//!
//! This crate owns everything about the facility collection that is not a
//! query: the storage schema, CSV upload validation, the parquet-backed
//! [`FacilityDataset`], the [`Facility`] record handed to API clients and
//! the site's [`VisitorCounter`].
use std::path::PathBuf;

use tracing::debug;

pub mod dataset;
mod error;
pub mod facility;
pub mod ingest;
pub mod schema;
pub mod test_data;
pub mod visitors;

pub use dataset::{FacilityDataset, IngestReport};
pub use error::{DataError, Result};
pub use facility::{Facility, GeoPoint};
pub use ingest::{ValidatedUpload, parse_upload, parse_upload_file};
pub use visitors::VisitorCounter;

pub const DATA_DIR_DEFAULT: &str = "./nearcare_data";

/// Where the facility collection lives when nothing else is configured.
///
/// `DATA_DIR` wins; with the `system-dirs` feature the platform data
/// directory is used next, otherwise [`DATA_DIR_DEFAULT`].
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DATA_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(feature = "system-dirs")]
    if let Some(dirs) = directories::ProjectDirs::from("org", "nearcare", "nearcare") {
        let dir = dirs.data_dir().to_path_buf();
        debug!(dir = ?dir, "Using system data directory");
        return dir;
    }

    debug!(dir = DATA_DIR_DEFAULT, "Using default data directory");
    PathBuf::from(DATA_DIR_DEFAULT)
}
