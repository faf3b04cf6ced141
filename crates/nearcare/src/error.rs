use thiserror::Error;

#[derive(Error, Debug)]
pub enum NearcareError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Geocoding error: {0}")]
    GeocodeError(#[from] crate::geocoder::GeocodeError),
    #[error("Data error: {0}")]
    DataError(#[from] nearcare_data::DataError),
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NearcareError>;
