//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - dispatches to the generate/preprocess/analyze stages
//! - prints terminal summaries
//! - writes the stage artifacts

use clap::Parser;

use crate::cli::{AnalyzeArgs, Command, GenerateArgs, PreprocessArgs};
use crate::domain::{AnalyzeConfig, GenerateConfig, PreprocessConfig};
use crate::error::AppError;

/// Entry point for the `fleet` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Generate(args) => handle_generate(args),
        Command::Preprocess(args) => handle_preprocess(args),
        Command::Analyze(args) => handle_analyze(args),
    }
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = generate_config_from_args(&args);
    let data = crate::data::generate(&config)?;
    crate::io::write_raw_csv(&config.out_path, &data)?;

    println!("=== fleet - generate ===");
    println!("Rows written:   {}", data.rows.len());
    println!("  base:         {}", data.rows.len() - data.duplicates);
    println!("  duplicates:   {}", data.duplicates);
    println!("Seed:           {}", config.seed);
    println!("Output:         {}", config.out_path.display());
    Ok(())
}

fn handle_preprocess(args: PreprocessArgs) -> Result<(), AppError> {
    let config = preprocess_config_from_args(&args);
    let ingested = crate::io::load_raw_assets(&config.raw_path)?;

    for note in &ingested.notes {
        match &note.id {
            Some(id) => log::warn!("line {} ({}): {}", note.line, id, note.message),
            None => log::warn!("line {}: {}", note.line, note.message),
        }
    }

    let output = crate::clean::preprocess(ingested.rows)?;
    crate::io::write_clean_csv(&config.clean_path, &output.assets)?;
    crate::io::write_features_csv(&config.features_path, &output.assets)?;

    let stats = &output.stats;
    println!("=== fleet - preprocess ===");
    println!("Rows read:             {}", ingested.rows_read);
    println!("Rows parsed:           {}", stats.rows_in);
    println!("Rows written:          {}", stats.rows_out);
    println!("Duplicates dropped:    {}", stats.duplicates_dropped);
    println!("Repair notes:          {}", ingested.notes.len());
    println!("Numeric imputed:       {}", stats.numeric_imputed);
    println!("Categorical imputed:   {}", stats.categorical_imputed);
    println!("Dates imputed:         {}", stats.dates_imputed);
    println!("Out-of-range cleared:  {}", stats.out_of_range_cleared);
    println!("Labels defaulted:      {}", stats.labels_defaulted);
    println!("Cleaned table:         {}", config.clean_path.display());
    println!("Feature table:         {}", config.features_path.display());
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analyze_config_from_args(&args);
    let assets = crate::io::read_clean_assets(&config.clean_path)?;

    let summary = crate::report::analyze(&assets, config.top_missing);
    let figures = crate::report::figures::render_all(&assets, &summary)?;
    crate::report::figures::write_figures(&config.report_dir.join("figures"), &figures)?;

    let static_path = crate::report::html::write_static_report(&config.report_dir, &summary, &figures)?;
    let interactive_path =
        crate::report::html::write_interactive_report(&config.report_dir, &assets, &summary)?;

    println!("{}", crate::report::format_run_summary(&summary));
    println!("Figures:            {}", config.report_dir.join("figures").display());
    println!("Static report:      {}", static_path.display());
    println!("Interactive report: {}", interactive_path.display());
    Ok(())
}

fn generate_config_from_args(args: &GenerateArgs) -> GenerateConfig {
    GenerateConfig {
        out_path: args.out.clone(),
        count: args.count,
        seed: args.seed,
        typo_frac: args.typo_frac,
        alt_date_frac: args.alt_date_frac,
        unit_frac: args.unit_frac,
        missing_frac: args.missing_frac,
        outlier_frac: args.outlier_frac,
        dup_frac: args.dup_frac,
    }
}

fn preprocess_config_from_args(args: &PreprocessArgs) -> PreprocessConfig {
    PreprocessConfig {
        raw_path: args.input.clone(),
        clean_path: args.clean_out.clone(),
        features_path: args.features_out.clone(),
    }
}

fn analyze_config_from_args(args: &AnalyzeArgs) -> AnalyzeConfig {
    AnalyzeConfig {
        clean_path: args.input.clone(),
        report_dir: args.report_dir.clone(),
        top_missing: args.top_missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn configs_mirror_cli_args() {
        let cli = crate::cli::Cli::parse_from([
            "fleet",
            "generate",
            "--count",
            "50",
            "--seed",
            "7",
            "--dup-frac",
            "0.1",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate subcommand");
        };
        let config = generate_config_from_args(&args);
        assert_eq!(config.count, 50);
        assert_eq!(config.seed, 7);
        assert_eq!(config.dup_frac, 0.1);
        // Untouched knobs keep their defaults.
        assert_eq!(config.typo_frac, 0.08);
    }
}
