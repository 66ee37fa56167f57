//! # CLI Integration Tests
//!
//! Argument parsing, command selection and error handling for the command-line interface.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::PathBuf;

    use crate::cli::{Cli, Commands, ConfigFormat, OutputFormat, TemplateType};
    use crate::source::SourceKind;

    /// Test basic CLI argument parsing
    #[test]
    fn test_cli_help() {
        let result = Cli::try_parse_from(["metsource", "--help"]);
        assert!(result.is_err()); // --help causes early exit with "error"

        let error = result.unwrap_err();
        assert!(
            error
                .to_string()
                .contains("metsource")
        );
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["metsource", "--version"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "metsource",
            "--verbose",
            "--output-format",
            "json",
            "--config",
            "/path/to/job.yaml",
            "datasets",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/job.yaml")));
        assert!(matches!(cli.command, Commands::Datasets));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["metsource", "-q", "-v", "datasets"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_command_basic() {
        let cli = Cli::parse_from([
            "metsource",
            "fetch",
            "ibtracs-sp",
            "-o",
            "ibtracs.parquet",
            "--preview",
            "5",
        ]);

        if let Commands::Fetch {
            source,
            kind,
            common,
        } = &cli.command
        {
            assert_eq!(source.as_deref(), Some("ibtracs-sp"));
            assert_eq!(kind, &None);
            assert_eq!(common.output.as_deref(), Some("ibtracs.parquet"));
            assert_eq!(common.preview, Some(5));
            assert!(!common.dry_run);
        } else {
            panic!("Expected Fetch command");
        }
    }

    #[test]
    fn test_fetch_command_with_kind() {
        let cli = Cli::parse_from([
            "metsource",
            "fetch",
            "tracks.csv",
            "--kind",
            "file",
            "--base-dir",
            "/data",
            "--dry-run",
        ]);

        if let Commands::Fetch { kind, common, .. } = &cli.command {
            assert_eq!(kind, &Some(SourceKind::File));
            assert_eq!(common.base_dir, Some(PathBuf::from("/data")));
            assert!(common.dry_run);
        } else {
            panic!("Expected Fetch command");
        }
    }

    #[test]
    fn test_fetch_rejects_unknown_kind() {
        let result = Cli::try_parse_from(["metsource", "fetch", "x", "--kind", "ftp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_command_with_params() {
        let cli = Cli::parse_from([
            "metsource",
            "dataset",
            "neiv-nova-test",
            "-p",
            "parameter=forecast_error",
            "--param",
            "extra=1",
        ]);

        if let Commands::Dataset { name, params, .. } = &cli.command {
            assert_eq!(name.as_deref(), Some("neiv-nova-test"));
            assert_eq!(params.len(), 2);
            assert_eq!(params[0].key, "parameter");
            assert_eq!(params[0].value, "forecast_error");
            assert_eq!(params[1].key, "extra");
        } else {
            panic!("Expected Dataset command");
        }
    }

    #[test]
    fn test_dataset_param_without_equals_is_rejected() {
        let result = Cli::try_parse_from([
            "metsource",
            "dataset",
            "neiv-nova-test",
            "-p",
            "forecast_error",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_command() {
        let cli = Cli::parse_from([
            "metsource",
            "describe",
            "neiv-nova-test",
            "--format",
            "yaml",
        ]);

        if let Commands::Describe { name, format } = &cli.command {
            assert_eq!(name, "neiv-nova-test");
            assert_eq!(format, &Some(OutputFormat::Yaml));
        } else {
            panic!("Expected Describe command");
        }
    }

    #[test]
    fn test_template_command() {
        let cli = Cli::parse_from([
            "metsource",
            "template",
            "dataset",
            "--output",
            "job.yaml",
            "--format",
            "yaml",
        ]);

        if let Commands::Template {
            template_type,
            output,
            format,
        } = &cli.command
        {
            assert_eq!(template_type, &TemplateType::Dataset);
            assert_eq!(output, &Some(PathBuf::from("job.yaml")));
            assert_eq!(format, &ConfigFormat::Yaml);
        } else {
            panic!("Expected Template command");
        }
    }

    #[test]
    fn test_output_format_values() {
        let formats = ["human", "json", "yaml", "csv"];

        for format in &formats {
            let cli = Cli::parse_from(["metsource", "--output-format", format, "datasets"]);

            match *format {
                "human" => assert_eq!(cli.output_format, OutputFormat::Human),
                "json" => assert_eq!(cli.output_format, OutputFormat::Json),
                "yaml" => assert_eq!(cli.output_format, OutputFormat::Yaml),
                "csv" => assert_eq!(cli.output_format, OutputFormat::Csv),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn test_completions_command() {
        let cli = Cli::parse_from(["metsource", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions { output: None, .. }));

        let result = Cli::try_parse_from(["metsource", "completions", "tcsh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_subcommand() {
        let result = Cli::try_parse_from(["metsource"]);
        assert!(result.is_err());
    }
}
