use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use polars::prelude::*;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use super::error::{DataError, Result};
use crate::ingest::ValidatedUpload;
use crate::schema::{ID, column_order, empty_facility_frame, missing_column};

pub const FACILITIES_PARQUET: &str = "facilities.parquet";

/// Outcome of appending an upload to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: usize,
    pub total: usize,
}

/// The persisted facility collection.
///
/// The parquet file is read once, on first access, and kept in memory.
/// Appends take the write lock, rewrite the file, then swap the frame, so
/// readers observe either the previous or the new collection.
pub struct FacilityDataset {
    path: Option<PathBuf>,
    frame: OnceCell<RwLock<DataFrame>>,
}

impl FacilityDataset {
    /// Use `<data_dir>/facilities.parquet`, creating the directory if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(FACILITIES_PARQUET);
        info!(path = ?path, exists = path.exists(), "Opening facility dataset");
        Ok(Self {
            path: Some(path),
            frame: OnceCell::new(),
        })
    }

    /// A dataset that lives only in memory. Appends are not written anywhere.
    pub fn in_memory(df: DataFrame) -> Result<Self> {
        if let Some(column) = missing_column(&df) {
            return Err(DataError::MissingColumn("<memory>".to_string(), column));
        }
        Ok(Self {
            path: None,
            frame: OnceCell::with_value(RwLock::new(df)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The current collection. Cloning a frame only bumps column refcounts.
    pub fn snapshot(&self) -> Result<DataFrame> {
        Ok(self.frame()?.read().clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.frame()?.read().height())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Assign ids continuing from the current maximum and append the rows.
    #[instrument(name = "Append facilities", skip_all, fields(rows = upload.accepted()), level = "info")]
    pub fn append(&self, upload: ValidatedUpload) -> Result<IngestReport> {
        let lock = self.frame()?;
        let mut frame = lock.write();

        let next_id = frame.column(ID)?.u64()?.max().map_or(1, |max| max + 1);
        let accepted = upload.accepted();
        let ids = Series::new(
            PlSmallStr::from_static(ID),
            (next_id..next_id + accepted as u64).collect::<Vec<u64>>(),
        );

        let mut rows = upload.rows;
        rows.with_column(ids)?;
        let rows = rows.select(column_order())?;
        let mut combined = frame.vstack(&rows)?;

        if let Some(path) = &self.path {
            write_parquet(&mut combined, path)?;
        }
        *frame = combined;

        let report = IngestReport {
            accepted,
            rejected: upload.rejected,
            total: frame.height(),
        };
        info!(?report, first_id = next_id, "Facilities appended");
        Ok(report)
    }

    fn frame(&self) -> Result<&RwLock<DataFrame>> {
        self.frame.get_or_try_init(|| {
            let df = match &self.path {
                Some(path) if path.exists() => load_parquet(path)?,
                _ => empty_facility_frame(),
            };
            Ok(RwLock::new(df))
        })
    }
}

fn load_parquet(path: &Path) -> Result<DataFrame> {
    info!(
        path = ?path.file_stem(),
        "Loading and collecting into memory for the first time..."
    );
    let t_load = std::time::Instant::now();
    // Eager read: the lazy scan drives its own async runtime and cannot run inside tokio.
    let df = ParquetReader::new(std::fs::File::open(path)?).finish()?;
    if let Some(column) = missing_column(&df) {
        return Err(DataError::MissingColumn(path.display().to_string(), column));
    }
    info!(
        rows = df.height(),
        time_collected = ?t_load.elapsed(),
        "Collected into memory"
    );
    Ok(df)
}

/// Write next to the target and rename over it so a crash never leaves a torn file.
fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let sink_time = std::time::Instant::now();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    ParquetWriter::new(tmp.as_file_mut()).finish(df)?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!(
        path = ?path.file_stem(),
        sink_time = ?sink_time.elapsed(),
        "Saved to parquet file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::Facility;
    use crate::ingest::parse_upload;
    use crate::test_data::{sample_facility_frame, sample_upload_csv};

    fn upload() -> ValidatedUpload {
        parse_upload(sample_upload_csv().into_bytes()).unwrap()
    }

    #[test]
    fn test_new_dataset_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = FacilityDataset::open(dir.path()).unwrap();
        assert!(dataset.is_empty().unwrap());
        assert!(!dir.path().join(FACILITIES_PARQUET).exists());
    }

    #[test]
    fn test_append_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = FacilityDataset::open(dir.path()).unwrap();

        let report = dataset.append(upload()).unwrap();
        assert_eq!(
            report,
            IngestReport {
                accepted: 3,
                rejected: 3,
                total: 3
            }
        );
        assert!(dir.path().join(FACILITIES_PARQUET).exists());

        let reopened = FacilityDataset::open(dir.path()).unwrap();
        let facilities = Facility::from_df(&reopened.snapshot().unwrap()).unwrap();
        let ids: Vec<u64> = facilities.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(facilities[0].facility_name, "Kenyatta National Hospital");
    }

    #[test]
    fn test_ids_continue_across_appends() {
        let dataset = FacilityDataset::in_memory(sample_facility_frame()).unwrap();

        let report = dataset.append(upload()).unwrap();
        assert_eq!(report.total, 9);

        let facilities = Facility::from_df(&dataset.snapshot().unwrap()).unwrap();
        let ids: Vec<u64> = facilities.iter().map(|f| f.id).collect();
        assert_eq!(ids, (1..=9).collect::<Vec<u64>>());
    }

    #[test]
    fn test_in_memory_rejects_incomplete_frames() {
        let df = df!["id" => [1u64]].unwrap();
        let err = FacilityDataset::in_memory(df).err().unwrap();
        assert!(matches!(err, DataError::MissingColumn(_, "country")));
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_appends() {
        let dataset = FacilityDataset::in_memory(sample_facility_frame()).unwrap();
        let before = dataset.snapshot().unwrap();
        dataset.append(upload()).unwrap();
        assert_eq!(before.height(), 6);
        assert_eq!(dataset.len().unwrap(), 9);
    }
}
