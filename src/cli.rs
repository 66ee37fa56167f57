//! # CLI Module
//!
//! Command-line interface for metsource:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML)
//! - Environment variables with the METSOURCE_ prefix
//! - Merging of CLI, environment and config-file values (CLI wins)
//! - Template generation and shell completions

use crate::catalog;
use crate::config::{FetchConfig, RequestConfig};
use crate::source::SourceKind;
use crate::storage::StorageFactory;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Fetch meteorological datasets into tables
#[derive(Parser, Debug)]
#[command(name = "metsource")]
#[command(about = "Fetch meteorological datasets and convert them to tables")]
#[command(version)]
#[command(long_about = "
metsource fetches meteorological datasets (hurricane tracks, forecast-error fields) from
local files, HTTP(S) endpoints or S3 and converts them into tables.

EXAMPLES:
  # Fetch a named source and save it as Parquet
  metsource fetch ibtracs-sp -o ibtracs_sp.parquet

  # Fetch an arbitrary URL
  metsource fetch https://example.org/tracks.csv --preview 10

  # Open a registered dataset from a local directory
  metsource dataset neiv-nova-test -p parameter=forecast_error --base-dir fixtures

  # List datasets and named sources
  metsource datasets

  # Using a config file
  metsource fetch --config job.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "METSOURCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a source and convert it to a table
    #[command(long_about = "
Fetch one source and convert it to a table.

SOURCE is a named source (see `metsource datasets`), an http(s):// URL, an s3:// path or a
local path. The kind is inferred unless --kind is given.

EXAMPLES:
  metsource fetch ibtracs-sp
  metsource fetch s3://bucket/tracks.csv -o tracks.parquet
  metsource fetch tracks.csv --kind file --base-dir /data
")]
    Fetch {
        /// Named source, URL, s3:// path or local path
        #[arg(value_name = "SOURCE", env = "METSOURCE_SOURCE")]
        source: Option<String>,

        /// Interpret SOURCE as this kind instead of inferring it
        #[arg(long, value_enum)]
        kind: Option<SourceKind>,

        #[command(flatten)]
        common: FetchArgs,
    },

    /// Open a registered dataset
    #[command(long_about = "
Open a registered dataset. Parameters are validated against the dataset's allow-list
before anything is read; the dataset file is <value>.csv inside --base-dir.

EXAMPLES:
  metsource dataset neiv-nova-test -p parameter=soil_temperature
  metsource dataset neiv-nova-test -p parameter=forecast_error -o out.csv
")]
    Dataset {
        /// Registered dataset name
        #[arg(value_name = "NAME")]
        name: Option<String>,

        /// Dataset parameter: key=value (can be used multiple times)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<ParamArg>,

        #[command(flatten)]
        common: FetchArgs,
    },

    /// List registered datasets and named sources
    Datasets,

    /// Show the registration metadata of a dataset
    Describe {
        /// Registered dataset name
        name: String,

        /// Output format for the description
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate configuration templates
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by `fetch` and `dataset`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Write the table here (.parquet, .pq or .csv; local or s3://)
    #[arg(short, long, env = "METSOURCE_OUTPUT")]
    pub output: Option<String>,

    /// Working directory for file sources
    #[arg(long, env = "METSOURCE_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Print the first N rows
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,

    /// Validate the request without reading anything
    #[arg(long, env = "METSOURCE_DRY_RUN")]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output (where applicable)
    Csv,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// Named remote source
    Named,
    /// Raw URL source
    Url,
    /// Registered dataset from a local directory
    Dataset,
    /// S3 input and output
    S3,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// Dataset parameter from the command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamArg {
    pub key: String,
    pub value: String,
}

/// Parse a dataset parameter: key=value
fn parse_param(s: &str) -> Result<ParamArg, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| "Parameter must be in format 'key=value'".to_string())?;

    let key = key.trim();
    if key.is_empty() {
        return Err("Parameter name cannot be empty".to_string());
    }

    // Values are passed on verbatim; allow-list validation happens later.
    Ok(ParamArg {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Turns a SOURCE argument into a request.
///
/// An explicit kind always wins. Otherwise s3:// and http(s):// prefixes pick their kind,
/// a catalog name becomes a named request, and anything else is a local file.
pub fn infer_request(source: &str, kind: Option<SourceKind>) -> RequestConfig {
    let kind = match kind {
        Some(kind) => kind,
        None if StorageFactory::is_s3_path(source) => SourceKind::S3,
        None if StorageFactory::is_http_path(source) => SourceKind::Url,
        None if catalog::find_source(source).is_some() => {
            return RequestConfig::Named {
                name: source.to_string(),
            };
        }
        None => SourceKind::File,
    };

    RequestConfig::Source {
        kind,
        locator: source.to_string(),
    }
}

/// Parse dataset parameters from METSOURCE_PARAMS: "key=value;key2=value2"
pub fn parse_params_from_env() -> Result<Vec<ParamArg>, String> {
    let mut params = Vec::new();

    if let Ok(raw) = env::var("METSOURCE_PARAMS")
        && !raw.trim().is_empty() {
            for param_str in raw.split(';') {
                let param_str = param_str.trim();
                if !param_str.is_empty() {
                    params.push(parse_param(param_str).map_err(|e| {
                        format!("Invalid parameter in METSOURCE_PARAMS: {}", e)
                    })?);
                }
            }
        }

    Ok(params)
}

/// Merge CLI parameters with METSOURCE_PARAMS
/// Priority: CLI arguments > Environment variables
pub fn merge_params(cli_params: Vec<ParamArg>) -> Result<BTreeMap<String, String>, String> {
    let chosen = if cli_params.is_empty() {
        parse_params_from_env()?
    } else {
        cli_params
    };

    let mut merged = BTreeMap::new();
    for param in chosen {
        if merged.insert(param.key.clone(), param.value).is_some() {
            return Err(format!("Parameter '{}' given more than once", param.key));
        }
    }
    Ok(merged)
}

/// Request for the `fetch` command.
///
/// `--kind` only qualifies a SOURCE, so giving it alone is an error.
pub fn fetch_cli_request(
    source: Option<&str>,
    kind: Option<SourceKind>,
) -> Result<Option<RequestConfig>, String> {
    match (source, kind) {
        (Some(source), kind) => Ok(Some(infer_request(source, kind))),
        (None, Some(kind)) => Err(format!("--kind {} needs a SOURCE argument", kind)),
        (None, None) => Ok(None),
    }
}

/// Request for the `dataset` command.
///
/// Without a NAME, parameters are layered over the config file's dataset request
/// (CLI values win per key). They are never dropped: with no dataset request to
/// attach them to, this is an error.
pub fn dataset_cli_request(
    name: Option<&str>,
    params: BTreeMap<String, String>,
    file_config: Option<&FetchConfig>,
) -> Result<Option<RequestConfig>, String> {
    if let Some(name) = name {
        return Ok(Some(RequestConfig::Dataset {
            name: name.to_string(),
            params,
        }));
    }
    if params.is_empty() {
        return Ok(None);
    }

    match file_config.map(|c| &c.request) {
        Some(RequestConfig::Dataset {
            name,
            params: file_params,
        }) => {
            let mut merged = file_params.clone();
            merged.extend(params);
            Ok(Some(RequestConfig::Dataset {
                name: name.clone(),
                params: merged,
            }))
        }
        _ => Err(
            "Dataset parameters need a dataset NAME or a config file with a dataset request"
                .to_string(),
        ),
    }
}

/// Builds the job from a CLI request and shared options, falling back to a config file.
///
/// CLI values win field by field; the config file fills whatever the CLI left unset.
pub fn build_fetch_config(
    request: Option<RequestConfig>,
    args: &FetchArgs,
    file_config: Option<FetchConfig>,
) -> Result<FetchConfig, String> {
    let mut config = match (request, file_config) {
        (Some(request), Some(mut file)) => {
            file.request = request;
            file
        }
        (Some(request), None) => FetchConfig::new(request),
        (None, Some(file)) => file,
        (None, None) => {
            return Err("Nothing to fetch: give a source/dataset or --config".to_string());
        }
    };

    if args.output.is_some() {
        config.output = args.output.clone();
    }
    if args.base_dir.is_some() {
        config.base_dir = args.base_dir.clone();
    }
    if args.preview.is_some() {
        config.preview = args.preview;
    }

    Ok(config)
}

/// Example configuration for each template type
pub fn generate_template(template_type: &TemplateType) -> FetchConfig {
    match template_type {
        TemplateType::Named => FetchConfig {
            output: Some("ibtracs_sp.parquet".to_string()),
            preview: Some(5),
            ..FetchConfig::new(RequestConfig::Named {
                name: "ibtracs-sp".to_string(),
            })
        },
        TemplateType::Url => FetchConfig {
            output: Some("tracks.csv".to_string()),
            ..FetchConfig::new(RequestConfig::Source {
                kind: SourceKind::Url,
                locator: catalog::IBTRACS_SP_URL.to_string(),
            })
        },
        TemplateType::Dataset => FetchConfig {
            base_dir: Some(PathBuf::from("data")),
            output: Some("forecast_error.parquet".to_string()),
            ..FetchConfig::new(RequestConfig::Dataset {
                name: "neiv-nova-test".to_string(),
                params: BTreeMap::from([(
                    "parameter".to_string(),
                    "forecast_error".to_string(),
                )]),
            })
        },
        TemplateType::S3 => FetchConfig {
            output: Some("s3://my-bucket/output/tracks.parquet".to_string()),
            log_level: Some("info".to_string()),
            ..FetchConfig::new(RequestConfig::Source {
                kind: SourceKind::S3,
                locator: "s3://my-bucket/input/tracks.csv".to_string(),
            })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Global mutex to ensure environment variable tests run sequentially
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_parse_param() {
        let result = parse_param("parameter=forecast_error").unwrap();
        assert_eq!(result.key, "parameter");
        assert_eq!(result.value, "forecast_error");

        // Only the first '=' splits
        let result = parse_param("expr=a=b").unwrap();
        assert_eq!(result.value, "a=b");

        // Values are kept verbatim
        let result = parse_param("parameter= Soil").unwrap();
        assert_eq!(result.value, " Soil");

        assert!(parse_param("parameter").is_err());
        assert!(parse_param("=forecast_error").is_err());
    }

    #[test]
    fn test_infer_request() {
        assert_eq!(
            infer_request("s3://bucket/a.csv", None),
            RequestConfig::Source {
                kind: SourceKind::S3,
                locator: "s3://bucket/a.csv".to_string()
            }
        );
        assert_eq!(
            infer_request("https://example.org/a.csv", None),
            RequestConfig::Source {
                kind: SourceKind::Url,
                locator: "https://example.org/a.csv".to_string()
            }
        );
        assert_eq!(
            infer_request("ibtracs-sp", None),
            RequestConfig::Named {
                name: "ibtracs-sp".to_string()
            }
        );
        assert_eq!(
            infer_request("ibtracs-sp", Some(SourceKind::File)),
            RequestConfig::Source {
                kind: SourceKind::File,
                locator: "ibtracs-sp".to_string()
            }
        );
        assert_eq!(
            infer_request("data/forecast_error.csv", None),
            RequestConfig::Source {
                kind: SourceKind::File,
                locator: "data/forecast_error.csv".to_string()
            }
        );
    }

    #[test]
    fn test_build_fetch_config_priority() {
        let file_config = FetchConfig {
            output: Some("from_file.parquet".to_string()),
            base_dir: Some(PathBuf::from("file_dir")),
            preview: Some(3),
            ..FetchConfig::new(RequestConfig::Named {
                name: "ibtracs-sp".to_string(),
            })
        };
        let args = FetchArgs {
            output: Some("from_cli.csv".to_string()),
            ..FetchArgs::default()
        };

        let merged = build_fetch_config(None, &args, Some(file_config.clone())).unwrap();
        assert_eq!(merged.request, file_config.request);
        assert_eq!(merged.output.as_deref(), Some("from_cli.csv"));
        assert_eq!(merged.base_dir, Some(PathBuf::from("file_dir")));
        assert_eq!(merged.preview, Some(3));

        let cli_request = infer_request("https://example.org/a.csv", None);
        let merged =
            build_fetch_config(Some(cli_request.clone()), &args, Some(file_config)).unwrap();
        assert_eq!(merged.request, cli_request);

        assert!(build_fetch_config(None, &args, None).is_err());
    }

    #[test]
    fn test_templates_are_loadable() {
        for template_type in [
            TemplateType::Named,
            TemplateType::Url,
            TemplateType::Dataset,
            TemplateType::S3,
        ] {
            let config = generate_template(&template_type);
            let json = config.to_json().unwrap();
            assert_eq!(FetchConfig::from_json(&json).unwrap(), config);
            let yaml = config.to_yaml().unwrap();
            assert_eq!(FetchConfig::from_yaml(&yaml).unwrap(), config);
        }
    }

    #[test]
    fn test_environment_param_parsing_and_merging() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        let original = env::var("METSOURCE_PARAMS").ok();

        unsafe {
            env::set_var("METSOURCE_PARAMS", "parameter=forecast_error; year=2020");
        }

        let params = parse_params_from_env().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].key, "year");

        // Environment is used when the CLI gave nothing
        let merged = merge_params(vec![]).unwrap();
        assert_eq!(merged.get("parameter").map(String::as_str), Some("forecast_error"));
        assert_eq!(merged.len(), 2);

        // CLI replaces the environment entirely
        let merged = merge_params(vec![ParamArg {
            key: "parameter".to_string(),
            value: "soil_temperature".to_string(),
        }])
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["parameter"], "soil_temperature");

        unsafe {
            env::set_var("METSOURCE_PARAMS", "broken");
        }
        assert!(parse_params_from_env().is_err());

        unsafe {
            env::remove_var("METSOURCE_PARAMS");
        }
        assert!(parse_params_from_env().unwrap().is_empty());

        unsafe {
            if let Some(ref val) = original {
                env::set_var("METSOURCE_PARAMS", val);
            }
        }
    }

    #[test]
    fn test_duplicate_params_are_rejected() {
        let dup = vec![
            ParamArg {
                key: "parameter".to_string(),
                value: "a".to_string(),
            },
            ParamArg {
                key: "parameter".to_string(),
                value: "b".to_string(),
            },
        ];
        assert!(merge_params(dup).is_err());
    }

    #[test]
    fn test_fetch_kind_without_source_is_rejected() {
        assert!(fetch_cli_request(None, Some(SourceKind::Url)).is_err());
        assert_eq!(fetch_cli_request(None, None).unwrap(), None);
        assert_eq!(
            fetch_cli_request(Some("tracks.csv"), Some(SourceKind::File)).unwrap(),
            Some(RequestConfig::Source {
                kind: SourceKind::File,
                locator: "tracks.csv".to_string(),
            })
        );
    }

    #[test]
    fn test_dataset_params_layer_over_config_request() {
        let file = generate_template(&TemplateType::Dataset);
        let params = BTreeMap::from([("parameter".to_string(), "soil_temperature".to_string())]);

        let request = dataset_cli_request(None, params.clone(), Some(&file)).unwrap();
        assert_eq!(
            request,
            Some(RequestConfig::Dataset {
                name: "neiv-nova-test".to_string(),
                params: params.clone(),
            })
        );

        // Nothing given on the command line leaves the config request alone
        assert_eq!(dataset_cli_request(None, BTreeMap::new(), Some(&file)).unwrap(), None);
    }

    #[test]
    fn test_dataset_params_without_dataset_request_are_rejected() {
        let params = BTreeMap::from([("parameter".to_string(), "forecast_error".to_string())]);

        assert!(dataset_cli_request(None, params.clone(), None).is_err());

        let named = generate_template(&TemplateType::Named);
        assert!(dataset_cli_request(None, params, Some(&named)).is_err());
    }
}
