//! # Table Output
//!
//! Writes a loaded DataFrame to Parquet or CSV, locally or to S3. The format follows the
//! output extension (`.parquet`/`.pq` or `.csv`).

use crate::storage::{StorageBackend, StorageError, StorageFactory};
use log::debug;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("cannot infer output format from '{0}', use .parquet, .pq or .csv")]
    UnsupportedFormat(String),

    #[error("cannot write to HTTP location '{0}'")]
    ReadOnlyLocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode table: {0}")]
    Encode(#[from] PolarsError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Csv,
}

impl TableFormat {
    pub fn from_path(path: &str) -> Result<Self, OutputError> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".parquet") || lower.ends_with(".pq") {
            Ok(TableFormat::Parquet)
        } else if lower.ends_with(".csv") {
            Ok(TableFormat::Csv)
        } else {
            Err(OutputError::UnsupportedFormat(path.to_string()))
        }
    }
}

/// Writes `df` to a local file in the given format.
pub fn write_dataframe(
    df: &DataFrame,
    output_path: &Path,
    format: TableFormat,
) -> Result<(), OutputError> {
    debug!("Writing DataFrame to {} as {:?}", output_path.display(), format);
    debug!("DataFrame shape: {:?}", df.shape());
    debug!("DataFrame schema:\n{:?}", df.schema());

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }

    let mut file = File::create(output_path)?;
    let mut df_clone = df.clone();
    match format {
        TableFormat::Parquet => {
            ParquetWriter::new(&mut file).finish(&mut df_clone)?;
        }
        TableFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df_clone)?;
        }
    }

    Ok(())
}

/// Writes `df` to a local or S3 destination, choosing the format from the extension.
///
/// S3 destinations are written to a temporary file first and then uploaded.
pub async fn write_output(df: &DataFrame, output_path: &str) -> Result<(), OutputError> {
    let format = TableFormat::from_path(output_path)?;

    if StorageFactory::is_http_path(output_path) {
        return Err(OutputError::ReadOnlyLocation(output_path.to_string()));
    }

    if StorageFactory::is_s3_path(output_path) {
        let temp_file = tempfile::NamedTempFile::new()?;
        write_dataframe(df, temp_file.path(), format)?;

        let storage = StorageFactory::from_path(output_path).await?;
        let data: Vec<u8> = tokio::fs::read(temp_file.path()).await?;
        storage.write(output_path, &data).await?;

        debug!("Uploaded {} bytes to {}", data.len(), output_path);
    } else {
        write_dataframe(df, Path::new(output_path), format)?;
    }

    Ok(())
}
