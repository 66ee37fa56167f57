//! # Describe Module
//!
//! Renders dataset registration metadata and loaded-table summaries for the console, as
//! human-readable text, JSON, YAML or CSV.

use crate::catalog::KnownSource;
use crate::dataset::{DatasetDescriptor, resolve_path};
use crate::source::{Source, SourceFormat, SourceKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration metadata of a dataset, as surfaced to catalogs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetInfo {
    pub name: String,
    pub home_page: String,
    pub licence: String,
    pub documentation: String,
    pub citation: String,
    pub terms_of_use: String,
    pub field: String,
    pub allowed: Vec<String>,
    /// File each allowed value resolves to
    pub files: Vec<String>,
}

impl From<&DatasetDescriptor> for DatasetInfo {
    fn from(d: &DatasetDescriptor) -> Self {
        Self {
            name: d.name.to_string(),
            home_page: d.home_page.to_string(),
            licence: d.licence.to_string(),
            documentation: d.documentation.to_string(),
            citation: d.citation.to_string(),
            terms_of_use: d.terms_of_use.to_string(),
            field: d.field.to_string(),
            allowed: d.allowed.iter().map(|v| v.to_string()).collect(),
            files: d.allowed.iter().map(|v| resolve_path(v)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub null_count: usize,
}

/// Shape and schema of a loaded table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSummary {
    pub locator: String,
    pub kind: SourceKind,
    pub format: SourceFormat,
    pub size_bytes: usize,
    pub fetched_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}

impl TableSummary {
    pub fn new(source: &Source, df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                data_type: format!("{}", c.dtype()),
                null_count: c.null_count(),
            })
            .collect();

        Self {
            locator: source.locator().to_string(),
            kind: source.kind(),
            format: source.format(),
            size_bytes: source.len(),
            fetched_at: source.fetched_at(),
            rows: df.height(),
            columns,
        }
    }
}

pub fn print_dataset_human(info: &DatasetInfo) {
    println!("Dataset: {}", info.name);
    println!("  Home page: {}", info.home_page);
    println!("  Licence: {}", info.licence);
    println!("  Documentation: {}", info.documentation);
    println!("  Citation: {}", info.citation);
    println!("  Terms of use: {}", info.terms_of_use.trim_end());
    println!("  Parameter '{}' accepts:", info.field);
    for (value, file) in info.allowed.iter().zip(&info.files) {
        println!("    {} -> {}", value, file);
    }
}

pub fn print_dataset_json(info: &DatasetInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

pub fn print_dataset_yaml(info: &DatasetInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize dataset info to YAML")?;
    println!("{}", yaml);
    Ok(())
}

pub fn print_dataset_csv(info: &DatasetInfo) {
    println!("dataset,field,value,file");
    for (value, file) in info.allowed.iter().zip(&info.files) {
        println!("{},{},{},{}", info.name, info.field, value, file);
    }
}

/// One line per registered dataset and known source
pub fn print_catalog_human(datasets: &[DatasetInfo], sources: &[KnownSource]) {
    println!("Datasets:");
    for d in datasets {
        println!("  {} ({}: {})", d.name, d.field, d.allowed.join(", "));
    }
    println!("Named sources:");
    for s in sources {
        println!("  {} [{}] - {}", s.name, s.kind, s.description);
    }
}

pub fn print_catalog_json(datasets: &[DatasetInfo], sources: &[KnownSource]) -> Result<()> {
    let json = serde_json::json!({
        "datasets": datasets,
        "sources": sources,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

pub fn print_catalog_yaml(datasets: &[DatasetInfo], sources: &[KnownSource]) -> Result<()> {
    #[derive(Serialize)]
    struct Catalog<'a> {
        datasets: &'a [DatasetInfo],
        sources: &'a [KnownSource],
    }
    let yaml = serde_yaml::to_string(&Catalog { datasets, sources })
        .context("Failed to serialize catalog to YAML")?;
    println!("{}", yaml);
    Ok(())
}

pub fn print_catalog_csv(datasets: &[DatasetInfo], sources: &[KnownSource]) {
    println!("entry,name,kind,detail");
    for d in datasets {
        println!("dataset,{},file,\"{}\"", d.name, d.files.join(";"));
    }
    for s in sources {
        println!("source,{},{},{}", s.name, s.kind, s.locator);
    }
}

pub fn print_table_summary_human(summary: &TableSummary) {
    println!("Table from {} ({}, {})", summary.locator, summary.kind, summary.format);
    println!("  Size: {:.2} KB", summary.size_bytes as f64 / 1024.0);
    println!("  Fetched at: {}", summary.fetched_at.to_rfc3339());
    println!("  Rows: {}", summary.rows);
    println!("  Columns: {} total", summary.columns.len());
    for col in &summary.columns {
        if col.null_count > 0 {
            println!("    {} ({}) - {} nulls", col.name, col.data_type, col.null_count);
        } else {
            println!("    {} ({})", col.name, col.data_type);
        }
    }
}

pub fn print_table_summary_json(summary: &TableSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

pub fn print_table_summary_yaml(summary: &TableSummary) -> Result<()> {
    let yaml =
        serde_yaml::to_string(summary).context("Failed to serialize table summary to YAML")?;
    println!("{}", yaml);
    Ok(())
}

pub fn print_table_summary_csv(summary: &TableSummary) {
    println!("column_name,data_type,null_count");
    for col in &summary.columns {
        println!("{},{},{}", col.name, col.data_type, col.null_count);
    }
}
