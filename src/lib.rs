//! # metsource
//!
//! Fetch meteorological datasets (hurricane best-track records, forecast-error fields)
//! from local files, HTTP(S) endpoints or S3, and turn them into polars DataFrames or
//! dense numeric arrays.
//!
//! ## Features
//!
//! - **One fetch operation**: a raw `(kind, locator)` source, a named source or a
//!   registered dataset all go through [`fetch_and_convert`]
//! - **Validated datasets**: dataset parameters are checked against an allow-list before
//!   any I/O happens
//! - **Pluggable loader**: retrieval sits behind the [`loader::Loader`] trait
//! - **Local, HTTP and S3**: storage backends are picked from the path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metsource::config::{FetchConfig, RequestConfig};
//! use metsource::process_fetch_job;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = FetchConfig::new(RequestConfig::Named { name: "ibtracs-sp".into() });
//!     config.output = Some("ibtracs_sp.parquet".into());
//!
//!     let fetched = process_fetch_job(&config).await?;
//!     println!("{}", fetched.table.head(Some(5)));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod describe;
pub mod loader;
pub mod log;
pub mod normalize;
pub mod output;
pub mod source;
pub mod storage;

#[cfg(test)]
mod cli_tests;

use crate::config::{FetchConfig, RequestConfig};
use crate::dataset::DatasetError;
use crate::loader::{Loader, StorageLoader};
use crate::normalize::normalize;
use crate::output::write_output;
use crate::source::{Source, SourceError};
use anyhow::Context;
use ::log::info;
use polars::prelude::DataFrame;

/// Retrieves whatever `request` names through `loader`.
pub async fn fetch_source(
    request: &RequestConfig,
    loader: &dyn Loader,
) -> Result<Source, DatasetError> {
    match request {
        RequestConfig::Source { kind, locator } => Ok(loader.load_source(*kind, locator).await?),
        RequestConfig::Named { name } => Ok(catalog::load_named_source(name, loader).await?),
        RequestConfig::Dataset { name, params } => {
            catalog::load_dataset(name, params, loader).await
        }
    }
}

/// Checks everything about `request` that can be checked without reading anything.
///
/// Raw sources must have a locator matching their kind, named sources must be in the
/// catalog and dataset parameters must pass the allow-list. No loader is involved.
pub fn validate_request(
    request: &RequestConfig,
    loader: &StorageLoader,
) -> Result<(), DatasetError> {
    match request {
        RequestConfig::Source { kind, locator } => {
            loader.storage_path(*kind, locator)?;
        }
        RequestConfig::Named { name } => {
            catalog::find_source(name)
                .ok_or_else(|| SourceError::UnknownNamedSource(name.to_string()))?;
        }
        RequestConfig::Dataset { name, params } => {
            let (descriptor, value) = catalog::dataset_request(name, params)?;
            let allowed = descriptor.allow_list()?;
            normalize(descriptor.field, value, &allowed)?;
        }
    }
    Ok(())
}

/// Loader for a job, rooted at its `base_dir` when one is set
pub fn job_loader(config: &FetchConfig) -> StorageLoader {
    match &config.base_dir {
        Some(dir) => StorageLoader::new(dir),
        None => StorageLoader::in_current_dir(),
    }
}

/// Retrieves `request` and converts it into a DataFrame.
///
/// Validation and loader errors are returned unchanged; nothing is retried.
pub async fn fetch_and_convert(
    request: &RequestConfig,
    loader: &dyn Loader,
) -> Result<DataFrame, DatasetError> {
    let source = fetch_source(request, loader).await?;
    Ok(source.to_dataframe()?)
}

/// A loaded source together with its parsed table
#[derive(Debug, Clone)]
pub struct FetchedTable {
    pub source: Source,
    pub table: DataFrame,
}

/// Runs a complete fetch job: load, convert, and write the table if an output is set.
///
/// # Errors
///
/// Fails if the request is invalid, the source cannot be loaded or parsed, or the output
/// cannot be written.
pub async fn process_fetch_job(config: &FetchConfig) -> anyhow::Result<FetchedTable> {
    let loader = job_loader(config);

    let source = fetch_source(&config.request, &loader)
        .await
        .with_context(|| format!("Failed to fetch {}", config.request.describe()))?;
    let table = source
        .to_dataframe()
        .with_context(|| format!("Failed to convert {}", source.locator()))?;
    info!("Loaded table with shape {:?}", table.shape());

    if let Some(output) = &config.output {
        write_output(&table, output)
            .await
            .with_context(|| format!("Failed to write output to {}", output))?;
        info!("Wrote table to {}", output);
    }

    Ok(FetchedTable { source, table })
}
