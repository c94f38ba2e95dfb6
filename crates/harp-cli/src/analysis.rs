//! # analysis-file Subcommand
//!
//! The final stage: folds the coded per-message records to one row per
//! respondent and writes both analysis CSVs (and, optionally, the
//! record sets as JSONL for downstream tooling such as graph
//! generation).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use harp_export::{generate_analysis_files, jsonl};
use harp_plan::PlanManifest;

/// Arguments for the `harp analysis-file` subcommand.
#[derive(Args, Debug)]
pub struct AnalysisFileArgs {
    /// Identifier of the user running this stage, for record provenance.
    pub user: String,
    /// Path to the plan manifest JSON file.
    pub plan_manifest: PathBuf,
    /// Directory holding the taxonomy definition files.
    pub scheme_dir: PathBuf,
    /// Path to the merged records JSONL file.
    pub input: PathBuf,
    /// Path to write the by-message analysis CSV to.
    pub csv_by_message: PathBuf,
    /// Path to write the by-respondent analysis CSV to.
    pub csv_by_respondent: PathBuf,
    /// Optionally write the consent-processed per-message records as
    /// JSONL.
    #[arg(long)]
    pub messages_jsonl: Option<PathBuf>,
    /// Optionally write the folded per-respondent records as JSONL.
    #[arg(long)]
    pub respondents_jsonl: Option<PathBuf>,
}

/// Run the analysis-file stage.
pub fn cmd_analysis_file(args: AnalysisFileArgs) -> Result<()> {
    let plans = PlanManifest::load(&args.plan_manifest)
        .with_context(|| format!("loading {}", args.plan_manifest.display()))?
        .resolve(&args.scheme_dir)?;

    let records = jsonl::import_jsonl_file(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let output = generate_analysis_files(
        &args.user,
        records,
        &plans,
        &args.csv_by_message,
        &args.csv_by_respondent,
    )?;

    if let Some(path) = &args.messages_jsonl {
        jsonl::export_jsonl_file(&output.messages, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.respondents_jsonl {
        jsonl::export_jsonl_file(&output.respondents, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
