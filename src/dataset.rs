//! # Datasets
//!
//! A dataset is a static [`DatasetDescriptor`]: descriptive metadata fixed at definition
//! time plus the allow-list for its one parameter. Opening a dataset validates the
//! parameter, derives `<parameter>.csv` and asks the loader for that file.
//!
//! ```rust,no_run
//! use metsource::dataset::{open_dataset, NEIV_NOVA_TEST};
//! use metsource::loader::StorageLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = StorageLoader::new("fixtures");
//!     let source = open_dataset(&NEIV_NOVA_TEST, "forecast_error", &loader).await?;
//!     println!("{}", source.to_dataframe()?);
//!     Ok(())
//! }
//! ```

use crate::loader::Loader;
use crate::normalize::{AllowList, normalize};
use crate::source::{Source, SourceError, SourceKind};
use log::debug;
use serde::Serialize;
use thiserror::Error;

/// Suffix appended to a parameter value to name its file
pub const RESOURCE_SUFFIX: &str = ".csv";

/// Errors raised while resolving and opening a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("invalid value '{value}' for '{field}', accepted values are: {}", .accepted.join(", "))]
    InvalidParameter {
        field: String,
        value: String,
        accepted: Vec<String>,
    },

    #[error("allow-list contains '{0}' more than once")]
    DuplicateAllowed(String),

    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("dataset '{dataset}' requires the '{field}' parameter")]
    MissingParameter { dataset: String, field: String },

    #[error("dataset '{dataset}' does not take a '{field}' parameter")]
    UnexpectedParameter { dataset: String, field: String },

    #[error(transparent)]
    SourceLoad(#[from] SourceError),
}

/// Static registration record for one dataset
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DatasetDescriptor {
    pub name: &'static str,
    pub home_page: &'static str,
    /// Licence of the data, not of this crate
    pub licence: &'static str,
    pub documentation: &'static str,
    pub citation: &'static str,
    /// Terms the user accepts by downloading the data
    pub terms_of_use: &'static str,
    /// Name of the validated field
    pub field: &'static str,
    pub allowed: &'static [&'static str],
}

impl DatasetDescriptor {
    /// # Errors
    /// Fails if the descriptor's allowed values contain duplicates.
    pub fn allow_list(&self) -> Result<AllowList, DatasetError> {
        AllowList::new(self.allowed.iter().copied())
    }
}

/// Forecast fields published by the neiv-nova test plugin
pub static NEIV_NOVA_TEST: DatasetDescriptor = DatasetDescriptor {
    name: "neiv-nova-test",
    home_page: "-",
    licence: "-",
    documentation: "-",
    citation: "-",
    terms_of_use: "By downloading data from this dataset, you agree to the terms and \
                   conditions defined at \
                   https://github.com/neivnova/climetlab-neiv-nova-test-plugin/blob/main/LICENSE. \
                   If you do not agree with such terms, do not download the data. ",
    field: "parameter",
    allowed: &["soil_temperature", "forecast_error"],
};

/// `<parameter>.csv`, verbatim.
pub fn resolve_path(parameter: &str) -> String {
    format!("{}{}", parameter, RESOURCE_SUFFIX)
}

/// Validates `parameter` against the descriptor and loads the matching file.
///
/// The loader is not called at all when validation fails, and is called exactly once
/// otherwise. Loader errors come back unchanged as [`DatasetError::SourceLoad`].
pub async fn open_dataset(
    descriptor: &DatasetDescriptor,
    parameter: &str,
    loader: &dyn Loader,
) -> Result<Source, DatasetError> {
    let allowed = descriptor.allow_list()?;
    let parameter = normalize(descriptor.field, parameter, &allowed)?;
    let path = resolve_path(parameter);

    debug!("Dataset '{}' resolved to {}", descriptor.name, path);
    Ok(loader.load_source(SourceKind::File, &path).await?)
}
