//! Registry of known datasets and named remote sources.

use crate::dataset::{DatasetDescriptor, DatasetError, NEIV_NOVA_TEST, open_dataset};
use crate::loader::Loader;
use crate::source::{Source, SourceError, SourceKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// IBTrACS v04r00 best-track records for the South Pacific basin
pub const IBTRACS_SP_URL: &str = "https://www.ncei.noaa.gov/data/international-best-track-archive-for-climate-stewardship-ibtracs/v04r00/access/csv/ibtracs.SP.list.v04r00.csv";

static DATASETS: &[&DatasetDescriptor] = &[&NEIV_NOVA_TEST];

/// A remote resource reachable by a short name
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KnownSource {
    pub name: &'static str,
    pub kind: SourceKind,
    pub locator: &'static str,
    pub description: &'static str,
}

pub static KNOWN_SOURCES: &[KnownSource] = &[KnownSource {
    name: "ibtracs-sp",
    kind: SourceKind::Url,
    locator: IBTRACS_SP_URL,
    description: "IBTrACS v04r00 hurricane best-track records, South Pacific basin",
}];

pub fn all() -> &'static [&'static DatasetDescriptor] {
    DATASETS
}

pub fn find(name: &str) -> Option<&'static DatasetDescriptor> {
    DATASETS.iter().copied().find(|d| d.name == name)
}

pub fn find_source(name: &str) -> Option<&'static KnownSource> {
    KNOWN_SOURCES.iter().find(|s| s.name == name)
}

/// Loads a named source through `loader`.
pub async fn load_named_source(name: &str, loader: &dyn Loader) -> Result<Source, SourceError> {
    let known =
        find_source(name).ok_or_else(|| SourceError::UnknownNamedSource(name.to_string()))?;
    loader.load_source(known.kind, known.locator).await
}

/// Checks a parameter map against a registered dataset without touching any loader.
///
/// The map must hold exactly the descriptor's field. Returns the descriptor and the
/// supplied value; allow-list membership is left to [`open_dataset`].
pub fn dataset_request<'p>(
    name: &str,
    params: &'p BTreeMap<String, String>,
) -> Result<(&'static DatasetDescriptor, &'p str), DatasetError> {
    let descriptor = find(name).ok_or_else(|| DatasetError::UnknownDataset(name.to_string()))?;

    if let Some(extra) = params.keys().find(|k| k.as_str() != descriptor.field) {
        return Err(DatasetError::UnexpectedParameter {
            dataset: descriptor.name.to_string(),
            field: extra.clone(),
        });
    }

    let value = params
        .get(descriptor.field)
        .ok_or_else(|| DatasetError::MissingParameter {
            dataset: descriptor.name.to_string(),
            field: descriptor.field.to_string(),
        })?;

    Ok((descriptor, value.as_str()))
}

/// Opens a registered dataset from a parameter map.
pub async fn load_dataset(
    name: &str,
    params: &BTreeMap<String, String>,
    loader: &dyn Loader,
) -> Result<Source, DatasetError> {
    let (descriptor, value) = dataset_request(name, params)?;
    open_dataset(descriptor, value, loader).await
}
