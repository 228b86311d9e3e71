//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - runs the parse pipeline
//! - prints where the outputs went

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::domain::ParseConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sevare-parse` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();

    let cli = Cli::parse();
    let config = parse_config_from_args(&cli);
    let run = pipeline::run_parse(&config)?;

    println!("Parsed {} slices into {}", run.report.slices.len(), run.layout.root.display());
    println!("  2D summary:     {}", run.layout.runtimes_path().display());
    println!("  protocol infos: {}", run.layout.protocol_infos_path().display());
    if !run.report.files_3d.is_empty() {
        println!("  3D slices:      {}", run.report.files_3d.len());
    }
    for entry in &run.report.winners {
        println!(
            "  {:<34} {}{}",
            entry.class.display_name(),
            entry.variable.tag(),
            entry.protocol
        );
    }

    Ok(())
}

pub fn parse_config_from_args(cli: &Cli) -> ParseConfig {
    ParseConfig {
        data_dir: cli.data_dir.clone(),
        sort_column: cli.sort.clone(),
        output_mode: cli.output_mode,
        export_json: cli.export_json.clone(),
    }
}

fn init_logging() {
    // Logs go to stderr so stdout stays a clean summary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
