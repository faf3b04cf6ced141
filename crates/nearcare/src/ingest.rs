use std::path::Path;
use std::sync::Arc;

use nearcare_data::{FacilityDataset, IngestReport, parse_upload, parse_upload_file};
use tracing::instrument;

use crate::error::Result;

/// Validate a CSV upload and append it, off the async runtime.
///
/// Nothing is written when the upload holds no valid row.
pub async fn ingest_csv(dataset: Arc<FacilityDataset>, bytes: Vec<u8>) -> Result<IngestReport> {
    let report = tokio::task::spawn_blocking(move || {
        let upload = parse_upload(bytes)?;
        dataset.append(upload)
    })
    .await??;
    Ok(report)
}

#[instrument(name = "Ingest file", skip(dataset), level = "info")]
pub fn ingest_file(dataset: &FacilityDataset, path: &Path) -> Result<IngestReport> {
    let upload = parse_upload_file(path)?;
    Ok(dataset.append(upload)?)
}
