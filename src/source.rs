//! # Source Handles
//!
//! A [`Source`] is the owned result of asking a loader for one resource. It keeps the raw
//! payload together with where it came from, and converts on demand into a polars
//! [`DataFrame`] or a dense [`NumericArray`].

use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use thiserror::Error;

const PARQUET_MAGIC: &[u8] = b"PAR1";

/// Errors raised while retrieving or converting a source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("locator '{locator}' is not valid for source kind '{kind}'")]
    InvalidLocator { kind: SourceKind, locator: String },

    #[error("unknown source kind '{0}', expected one of: file, url, s3")]
    UnknownKind(String),

    #[error("unknown named source '{0}'")]
    UnknownNamedSource(String),

    #[error("failed to parse {format} data from '{locator}': {source}")]
    Parse {
        format: SourceFormat,
        locator: String,
        #[source]
        source: PolarsError,
    },
}

/// How a locator is interpreted by the loader
#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Path relative to the loader's working directory
    File,
    /// HTTP(S) URL
    Url,
    /// S3 object (s3://bucket/key)
    S3,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Url => "url",
            SourceKind::S3 => "s3",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(SourceKind::File),
            "url" => Ok(SourceKind::Url),
            "s3" => Ok(SourceKind::S3),
            other => Err(SourceError::UnknownKind(other.to_string())),
        }
    }
}

/// Payload format, sniffed from content and locator
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Parquet,
}

impl SourceFormat {
    /// Format from the locator's extension, if it names one.
    pub fn from_extension(locator: &str) -> Option<Self> {
        let lower = locator.to_ascii_lowercase();
        if lower.ends_with(".parquet") || lower.ends_with(".pq") {
            Some(SourceFormat::Parquet)
        } else if lower.ends_with(".csv") {
            Some(SourceFormat::Csv)
        } else {
            None
        }
    }

    /// An explicit extension wins. Without one, a payload framed by the `PAR1` magic at
    /// both ends is Parquet and anything else is CSV.
    pub fn sniff(locator: &str, data: &[u8]) -> Self {
        if let Some(format) = Self::from_extension(locator) {
            return format;
        }
        let framed = data.len() >= 2 * PARQUET_MAGIC.len()
            && data.starts_with(PARQUET_MAGIC)
            && data.ends_with(PARQUET_MAGIC);
        if framed {
            SourceFormat::Parquet
        } else {
            SourceFormat::Csv
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => f.write_str("csv"),
            SourceFormat::Parquet => f.write_str("parquet"),
        }
    }
}

/// Owned handle to a retrieved resource
#[derive(Debug, Clone)]
pub struct Source {
    kind: SourceKind,
    locator: String,
    format: SourceFormat,
    data: Vec<u8>,
    fetched_at: DateTime<Utc>,
}

impl Source {
    /// Wraps an already retrieved payload, sniffing its format.
    pub fn from_bytes(kind: SourceKind, locator: impl Into<String>, data: Vec<u8>) -> Self {
        let locator = locator.into();
        let format = SourceFormat::sniff(&locator, &data);
        Self {
            kind,
            locator,
            format,
            data,
            fetched_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parses the payload into a DataFrame.
    ///
    /// CSV payloads are read with a header row, and column types are inferred from every
    /// row so a late float in an integer-looking column still parses.
    pub fn to_dataframe(&self) -> Result<DataFrame, SourceError> {
        debug!(
            "Parsing {} bytes of {} from {}",
            self.data.len(),
            self.format,
            self.locator
        );

        let cursor = Cursor::new(self.data.as_slice());
        let parsed = match self.format {
            SourceFormat::Csv => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None)
                .into_reader_with_file_handle(cursor)
                .finish(),
            SourceFormat::Parquet => ParquetReader::new(cursor).finish(),
        };

        parsed.map_err(|source| SourceError::Parse {
            format: self.format,
            locator: self.locator.clone(),
            source,
        })
    }

    /// Parses the payload and casts every column to `f64`.
    pub fn to_array(&self) -> Result<NumericArray, SourceError> {
        let df = self.to_dataframe()?;
        NumericArray::from_dataframe(&df).map_err(|source| SourceError::Parse {
            format: self.format,
            locator: self.locator.clone(),
            source,
        })
    }
}

/// Dense row-major `f64` matrix built from a DataFrame
///
/// Values that cannot be represented as numbers (nulls, free text) become `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f64>,
}

impl NumericArray {
    pub fn from_dataframe(df: &DataFrame) -> PolarsResult<Self> {
        let rows = df.height();
        let width = df.width();
        let mut data = vec![f64::NAN; rows * width];
        let mut columns = Vec::with_capacity(width);

        for (c, column) in df.get_columns().iter().enumerate() {
            columns.push(column.name().to_string());
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            for (r, value) in series.f64()?.into_iter().enumerate() {
                if let Some(v) = value {
                    data[r * width + c] = v;
                }
            }
        }

        Ok(Self {
            columns,
            rows,
            data,
        })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.columns.len() {
            Some(self.data[row * self.columns.len() + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let width = self.columns.len();
        (row < self.rows).then(|| &self.data[row * width..(row + 1) * width])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
