use crate::config::FetchConfig;
use polars::prelude::DataFrame;
use std::time::Duration;

pub fn show_greeting(what: &str) {
    println!("=== Meteorological Source Fetcher ===");
    println!("Request: {}", what);
}

pub fn config_echo(config: &FetchConfig) {
    println!("\nConfiguration:");
    println!("  Request: {}", config.request.describe());
    match &config.base_dir {
        Some(dir) => println!("  Base directory: {}", dir.display()),
        None => println!("  Base directory: ."),
    }
    match &config.output {
        Some(output) => println!("  Output: {}", output),
        None => println!("  Output: (none)"),
    }
}

pub fn show_preview(df: &DataFrame, rows: usize) {
    println!("\nTable ({} rows x {} columns):", df.height(), df.width());
    println!("{}", df.head(Some(rows)));
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!(
        "\n=== Fetch completed in {:.2}s ===",
        elapsed.as_secs_f64()
    );
}
