//! Command-line parsing for the laptop fleet EDA pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the cleaning/analysis code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fleet", version, about = "Laptop fleet telemetry EDA pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands, one per pipeline stage.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic dirty telemetry CSV.
    Generate(GenerateArgs),
    /// Clean and impute the raw CSV, derive features, write the processed tables.
    Preprocess(PreprocessArgs),
    /// Analyze the cleaned table: stats, charts, and HTML reports.
    Analyze(AnalyzeArgs),
}

/// Options for `fleet generate`.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Output path for the dirty CSV.
    #[arg(long, default_value = "data/raw/laptops_dirty.csv")]
    pub out: PathBuf,

    /// Number of base machines to generate (duplicates come on top).
    #[arg(short = 'n', long, default_value_t = 500)]
    pub count: usize,

    /// Random seed. Same seed, same file.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows with a misspelled vendor.
    #[arg(long, default_value_t = 0.08)]
    pub typo_frac: f64,

    /// Fraction of rows with a non-ISO date format.
    #[arg(long, default_value_t = 0.25)]
    pub alt_date_frac: f64,

    /// Fraction of rows with a unit suffix glued to a number.
    #[arg(long, default_value_t = 0.15)]
    pub unit_frac: f64,

    /// Fraction of fields blanked out per corruptible column.
    #[arg(long, default_value_t = 0.06)]
    pub missing_frac: f64,

    /// Fraction of rows with an implausible outlier value.
    #[arg(long, default_value_t = 0.03)]
    pub outlier_frac: f64,

    /// Fraction of rows duplicated with drifted telemetry.
    #[arg(long, default_value_t = 0.04)]
    pub dup_frac: f64,
}

/// Options for `fleet preprocess`.
#[derive(Debug, Parser, Clone)]
pub struct PreprocessArgs {
    /// Input: the raw (dirty) CSV.
    #[arg(long, default_value = "data/raw/laptops_dirty.csv")]
    pub input: PathBuf,

    /// Output path for the cleaned table.
    #[arg(long, default_value = "data/processed/laptops_clean.csv")]
    pub clean_out: PathBuf,

    /// Output path for the modeling feature table.
    #[arg(long, default_value = "data/processed/laptops_features.csv")]
    pub features_out: PathBuf,
}

/// Options for `fleet analyze`.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Input: the cleaned CSV produced by `fleet preprocess`.
    #[arg(long, default_value = "data/processed/laptops_clean.csv")]
    pub input: PathBuf,

    /// Directory for reports and figures.
    #[arg(long, default_value = "reports")]
    pub report_dir: PathBuf,

    /// How many columns to show in the missing-value table.
    #[arg(long, default_value_t = 25)]
    pub top_missing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_defaults_match_pipeline_conventions() {
        let cli = Cli::parse_from(["fleet", "generate"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate subcommand");
        };
        assert_eq!(args.count, 500);
        assert_eq!(args.seed, 42);
        assert_eq!(args.out, PathBuf::from("data/raw/laptops_dirty.csv"));
    }

    #[test]
    fn analyze_accepts_overrides() {
        let cli = Cli::parse_from([
            "fleet",
            "analyze",
            "--input",
            "other/clean.csv",
            "--top-missing",
            "5",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze subcommand");
        };
        assert_eq!(args.input, PathBuf::from("other/clean.csv"));
        assert_eq!(args.top_missing, 5);
    }
}
