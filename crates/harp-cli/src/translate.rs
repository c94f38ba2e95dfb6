//! # translate-keys Subcommand

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use harp_export::jsonl;
use harp_plan::PipelineConfig;

/// Arguments for the `harp translate-keys` subcommand.
#[derive(Args, Debug)]
pub struct TranslateKeysArgs {
    /// Identifier of the user running this stage, for record provenance.
    pub user: String,
    /// Path to the pipeline configuration JSON file.
    pub pipeline_configuration: PathBuf,
    /// Path to the raw records JSONL file from the fetch layer.
    pub input: PathBuf,
    /// Path to write the translated records JSONL file to.
    pub output: PathBuf,
}

/// Run the key-translation stage.
pub fn cmd_translate_keys(args: TranslateKeysArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.pipeline_configuration)
        .with_context(|| format!("loading {}", args.pipeline_configuration.display()))?;

    let mut records = jsonl::import_jsonl_file(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    harp_engine::translate::translate_keys(&args.user, &mut records, &config)?;

    jsonl::export_jsonl_file(&records, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}
