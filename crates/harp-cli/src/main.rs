//! # harp CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// HARP pipeline — radio-survey data coding and analysis toolchain.
///
/// Translates platform exports, auto-codes raw answers, merges manually
/// verified codes, and generates the analysis files.
#[derive(Parser, Debug)]
#[command(name = "harp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Remap platform keys to pipeline keys and identify shows.
    TranslateKeys(harp_cli::translate::TranslateKeysArgs),
    /// Filter, auto-code, and export files for manual coding.
    AutoCode(harp_cli::auto_code::AutoCodeArgs),
    /// Merge verified codes from the external coding tool.
    ApplyManualCodes(harp_cli::manual_codes::ApplyManualCodesArgs),
    /// Fold to one row per respondent and write the analysis CSVs.
    AnalysisFile(harp_cli::analysis::AnalysisFileArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::TranslateKeys(args) => harp_cli::translate::cmd_translate_keys(args),
        Commands::AutoCode(args) => harp_cli::auto_code::cmd_auto_code(args),
        Commands::ApplyManualCodes(args) => {
            harp_cli::manual_codes::cmd_apply_manual_codes(args)
        }
        Commands::AnalysisFile(args) => harp_cli::analysis::cmd_analysis_file(args),
    }
}
