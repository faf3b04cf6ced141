//! Parsing and validation of facility CSV uploads.
//!
//! Every column is read as text. Known headers are renamed to their storage
//! names, absent headers become empty strings, and rows whose latitude or
//! longitude does not parse to an in-range number are dropped.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use tracing::{info, instrument, warn};

use super::error::{DataError, Result};
use crate::schema::{CSV_LATITUDE, CSV_LONGITUDE, CSV_TEXT_COLUMNS, LATITUDE, LONGITUDE};

/// Rows that survived validation, in storage layout minus the `id` column.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub rows: DataFrame,
    pub rejected: usize,
}

impl ValidatedUpload {
    pub fn accepted(&self) -> usize {
        self.rows.height()
    }
}

#[instrument(name = "Parse facility upload", skip_all, fields(bytes = bytes.len()), level = "info")]
pub fn parse_upload(bytes: Vec<u8>) -> Result<ValidatedUpload> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DataError::EmptyUpload);
    }

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    validate_rows(&raw)
}

pub fn parse_upload_file(path: impl AsRef<Path>) -> Result<ValidatedUpload> {
    let path = path.as_ref();
    info!(path = ?path, "Reading facility upload from disk");
    parse_upload(std::fs::read(path)?)
}

fn validate_rows(raw: &DataFrame) -> Result<ValidatedUpload> {
    let has = |header: &str| raw.column(header).is_ok();

    let mut columns: Vec<Expr> = CSV_TEXT_COLUMNS
        .iter()
        .map(|&(header, column)| {
            if has(header) {
                col(header)
                    .cast(DataType::String)
                    .fill_null(lit(""))
                    .alias(column)
            } else {
                lit("").alias(column)
            }
        })
        .collect();

    for (header, column) in [(CSV_LATITUDE, LATITUDE), (CSV_LONGITUDE, LONGITUDE)] {
        if !has(header) {
            warn!(header, "Upload has no coordinate column, every row will be rejected");
        }
        columns.push(coordinate(header, has(header)).alias(column));
    }

    let rows = raw
        .clone()
        .lazy()
        .select(columns)
        .filter(in_range(LATITUDE, 90.0).and(in_range(LONGITUDE, 180.0)))
        .collect()?;

    let rejected = raw.height() - rows.height();
    info!(accepted = rows.height(), rejected, "Validated facility upload");

    if rows.height() == 0 {
        return Err(DataError::NoValidRows);
    }
    Ok(ValidatedUpload { rows, rejected })
}

/// Unparsable text casts to null, which the range filter then drops.
/// Surrounding whitespace is not part of the number.
fn coordinate(header: &str, present: bool) -> Expr {
    if present {
        col(header)
            .str()
            .strip_chars(lit(NULL))
            .cast(DataType::Float64)
    } else {
        lit(NULL).cast(DataType::Float64)
    }
}

fn in_range(column: &str, bound: f64) -> Expr {
    col(column)
        .gt_eq(lit(-bound))
        .and(col(column).lt_eq(lit(bound)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{COUNTRY, FACILITY_NAME, HOURS, SERVICES, TEXT_COLUMNS};
    use crate::test_data::{create_sample_upload_file, sample_upload_csv};

    #[test]
    fn test_rows_without_coordinates_are_rejected() {
        let upload = parse_upload(sample_upload_csv().into_bytes()).unwrap();

        assert_eq!(upload.accepted(), 3);
        assert_eq!(upload.rejected, 3);

        let names: Vec<Option<&str>> = upload
            .rows
            .column(FACILITY_NAME)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            names,
            vec![
                Some("Kenyatta National Hospital"),
                Some("Coast General Hospital"),
                Some("Jaramogi Oginga Odinga Hospital"),
            ]
        );
    }

    #[test]
    fn test_output_uses_storage_columns() {
        let upload = parse_upload(sample_upload_csv().into_bytes()).unwrap();
        let df = &upload.rows;

        for column in TEXT_COLUMNS {
            assert_eq!(df.column(column).unwrap().dtype(), &DataType::String);
            assert_eq!(df.column(column).unwrap().null_count(), 0);
        }
        assert_eq!(df.column(LATITUDE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(LONGITUDE).unwrap().dtype(), &DataType::Float64);

        let services = df.column(SERVICES).unwrap().str().unwrap().get(0);
        assert_eq!(services, Some("Emergency, Oncology"));
    }

    #[test]
    fn test_missing_optional_headers_default_to_empty() {
        let csv = "Country,Facility_Name,Latitude,Longitude\nGhana,Ridge Hospital,5.5600,-0.1969\n";
        let upload = parse_upload(csv.as_bytes().to_vec()).unwrap();

        assert_eq!(upload.accepted(), 1);
        let df = &upload.rows;
        assert_eq!(df.column(COUNTRY).unwrap().str().unwrap().get(0), Some("Ghana"));
        assert_eq!(df.column(HOURS).unwrap().str().unwrap().get(0), Some(""));
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let csv = "Country,Latitude,Longitude\nX,91.0,10.0\nY,10.0,-180.5\nZ,NaN,1.0\nW,1.0,1.0\n";
        let upload = parse_upload(csv.as_bytes().to_vec()).unwrap();
        assert_eq!(upload.accepted(), 1);
        assert_eq!(upload.rejected, 3);
    }

    #[test]
    fn test_padded_coordinates_are_accepted() {
        let csv = "Country,Latitude,Longitude\nKenya, -1.30 , 36.8\nKenya,-1.30,36.8\n";
        let upload = parse_upload(csv.as_bytes().to_vec()).unwrap();
        assert_eq!(upload.accepted(), 2);
        assert_eq!(upload.rejected, 0);

        let latitudes: Vec<Option<f64>> = upload
            .rows
            .column(LATITUDE)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(latitudes, vec![Some(-1.30), Some(-1.30)]);
    }

    #[test]
    fn test_ragged_rows_do_not_fail_the_upload() {
        let csv = "Country,Latitude,Longitude\nKenya,-1.30,36.8,stray\nGhana,5.56,-0.19\n";
        let upload = parse_upload(csv.as_bytes().to_vec()).unwrap();
        assert_eq!(upload.accepted(), 2);

        let countries: Vec<Option<&str>> = upload
            .rows
            .column(COUNTRY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(countries, vec![Some("Kenya"), Some("Ghana")]);
    }

    #[test]
    fn test_no_valid_rows_is_an_error() {
        let csv = "Country,Latitude,Longitude\nKenya,,\n";
        let err = parse_upload(csv.as_bytes().to_vec()).unwrap_err();
        assert!(matches!(err, DataError::NoValidRows));

        let csv = "Country,Facility_Name\nKenya,Somewhere\n";
        let err = parse_upload(csv.as_bytes().to_vec()).unwrap_err();
        assert!(matches!(err, DataError::NoValidRows));
    }

    #[test]
    fn test_empty_upload_is_an_error() {
        let err = parse_upload(b"  \n".to_vec()).unwrap_err();
        assert!(matches!(err, DataError::EmptyUpload));
    }

    #[test]
    fn test_parse_upload_file() {
        let file = create_sample_upload_file().unwrap();
        let upload = parse_upload_file(file.path()).unwrap();
        assert_eq!(upload.accepted(), 3);
    }
}
