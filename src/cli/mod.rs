//! Command-line parsing for the SEVARE result parser.
//!
//! Argument parsing stays here; the parse pipeline itself lives in `app::pipeline`.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::OutputMode;

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "sevare-parse",
    version,
    about = "Slice SEVARE benchmark results per protocol, fit runtime curves and rank protocols"
)]
pub struct Cli {
    /// Test-run folder holding `data/` and the `E*-run-summary.dat` file.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Sort rows by this column (within each protocol) before slicing.
    #[arg(short = 's', long = "sort", value_name = "COLUMN")]
    pub sort: Option<String>,

    /// What to do with outputs of a previous run.
    #[arg(long, value_enum, default_value_t = OutputMode::Overwrite)]
    pub output_mode: OutputMode,

    /// Also write the full run report (fits + winners) as JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["sevare-parse", "runs/E01"]).unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("runs/E01"));
        assert_eq!(cli.sort, None);
        assert_eq!(cli.output_mode, OutputMode::Overwrite);
        assert_eq!(cli.export_json, None);
    }

    #[test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "sevare-parse",
            "runs/E01",
            "-s",
            "latencies(ms)",
            "--output-mode",
            "versioned",
            "--export-json",
            "out.json",
        ])
        .unwrap();
        assert_eq!(cli.sort.as_deref(), Some("latencies(ms)"));
        assert_eq!(cli.output_mode, OutputMode::Versioned);
        assert_eq!(cli.export_json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn data_dir_is_required() {
        assert!(Cli::try_parse_from(["sevare-parse"]).is_err());
    }
}
