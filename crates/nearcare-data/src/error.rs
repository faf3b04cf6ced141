use polars::prelude::PolarsError;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("No valid rows found (lat/lon missing)")]
    NoValidRows,
    #[error("Facility upload is empty")]
    EmptyUpload,
    #[error("Facility data at {0} is missing required column '{1}'")]
    MissingColumn(String, &'static str),
    #[error("Visitor total at {0} is not a number")]
    InvalidVisitorTotal(String),
}
