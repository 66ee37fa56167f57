use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use metsource::catalog;
use metsource::cli::{
    Cli, Commands, ConfigFormat, OutputFormat, build_fetch_config, dataset_cli_request,
    fetch_cli_request, generate_template, merge_params,
};
use metsource::config::FetchConfig;
use metsource::describe::{self, DatasetInfo, TableSummary};
use metsource::{FetchedTable, job_loader, process_fetch_job, validate_request};
use metsource::log::{config_echo, show_farewell_with_timing, show_greeting, show_preview};
use metsource::output::TableFormat;
use std::io::Write;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => Some(
            FetchConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
        ),
        None => None,
    };

    init_logging(&cli, file_config.as_ref());
    debug!("Parsed arguments: {:?}", cli);

    match cli.command {
        Commands::Fetch {
            ref source,
            kind,
            ref common,
        } => {
            let request = fetch_cli_request(source.as_deref(), kind).map_err(|e| anyhow!(e))?;
            let config =
                build_fetch_config(request, common, file_config).map_err(|e| anyhow!(e))?;
            run_fetch(&cli, config, common.dry_run).await
        }
        Commands::Dataset {
            ref name,
            ref params,
            ref common,
        } => {
            let params = merge_params(params.clone()).map_err(|e| anyhow!(e))?;
            let request = dataset_cli_request(name.as_deref(), params, file_config.as_ref())
                .map_err(|e| anyhow!(e))?;
            let config =
                build_fetch_config(request, common, file_config).map_err(|e| anyhow!(e))?;
            run_fetch(&cli, config, common.dry_run).await
        }
        Commands::Datasets => {
            let datasets: Vec<DatasetInfo> =
                catalog::all().iter().map(|d| DatasetInfo::from(*d)).collect();
            match cli.output_format {
                OutputFormat::Json => describe::print_catalog_json(&datasets, catalog::KNOWN_SOURCES),
                OutputFormat::Yaml => describe::print_catalog_yaml(&datasets, catalog::KNOWN_SOURCES),
                OutputFormat::Csv => {
                    describe::print_catalog_csv(&datasets, catalog::KNOWN_SOURCES);
                    Ok(())
                }
                OutputFormat::Human => {
                    describe::print_catalog_human(&datasets, catalog::KNOWN_SOURCES);
                    Ok(())
                }
            }
        }
        Commands::Describe { ref name, ref format } => {
            let descriptor = catalog::find(name)
                .ok_or_else(|| anyhow!("Unknown dataset '{}'", name))?;
            let info = DatasetInfo::from(descriptor);
            match format.as_ref().unwrap_or(&cli.output_format) {
                OutputFormat::Human => describe::print_dataset_human(&info),
                OutputFormat::Json => describe::print_dataset_json(&info)?,
                OutputFormat::Yaml => describe::print_dataset_yaml(&info)?,
                OutputFormat::Csv => describe::print_dataset_csv(&info),
            }
            Ok(())
        }
        Commands::Template {
            ref template_type,
            ref output,
            ref format,
        } => {
            let config = generate_template(template_type);
            let rendered = match format {
                ConfigFormat::Json => config.to_json()?,
                ConfigFormat::Yaml => config.to_yaml()?,
            };
            match output {
                Some(path) => {
                    std::fs::write(path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        println!("Template written to {}", path.display());
                    }
                }
                None => println!("{}", rendered),
            }
            Ok(())
        }
        Commands::Completions {
            shell,
            ref output,
        } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            match output {
                Some(path) => {
                    let mut file = std::fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    clap_complete::generate(shell, &mut command, name, &mut file);
                }
                None => {
                    let mut stdout = std::io::stdout();
                    clap_complete::generate(shell, &mut command, name, &mut stdout);
                    stdout.flush()?;
                }
            }
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli, file_config: Option<&FetchConfig>) {
    let level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("METSOURCE_LOG_LEVEL") {
        level
    } else if let Some(level) = file_config.and_then(|c| c.log_level.clone()) {
        level
    } else {
        "warn".to_string()
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

async fn run_fetch(cli: &Cli, config: FetchConfig, dry_run: bool) -> Result<()> {
    let start_time = Instant::now();
    let human = cli.output_format == OutputFormat::Human && !cli.quiet;

    if human {
        show_greeting(&config.request.describe());
        config_echo(&config);
    }

    if let Some(output) = &config.output {
        TableFormat::from_path(output)?;
    }

    if dry_run {
        validate_request(&config.request, &job_loader(&config))?;
        if !cli.quiet {
            println!("Dry run: request is valid, nothing was fetched");
        }
        return Ok(());
    }

    let spinner = (!cli.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching {}", config.request.describe()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let fetched = process_fetch_job(&config).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let FetchedTable { source, table: df } = fetched?;

    let summary = TableSummary::new(&source, &df);
    match cli.output_format {
        OutputFormat::Human if !cli.quiet => {
            describe::print_table_summary_human(&summary);
            if let Some(rows) = config.preview {
                show_preview(&df, rows);
            }
            show_farewell_with_timing(start_time.elapsed());
        }
        OutputFormat::Human => {}
        OutputFormat::Json => describe::print_table_summary_json(&summary)?,
        OutputFormat::Yaml => describe::print_table_summary_yaml(&summary)?,
        OutputFormat::Csv => describe::print_table_summary_csv(&summary),
    }

    Ok(())
}
