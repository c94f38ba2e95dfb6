//! # apply-manual-codes Subcommand
//!
//! Merges the external coding tool's verified labels back into the
//! record set. Plans whose coded file is missing keep their auto-codes —
//! coding happens incrementally, and an uncoded plan is not an error.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use harp_engine::coda;
use harp_export::jsonl;
use harp_plan::PlanManifest;
use harp_scheme::CodeScheme;

/// Arguments for the `harp apply-manual-codes` subcommand.
#[derive(Args, Debug)]
pub struct ApplyManualCodesArgs {
    /// Identifier of the user running this stage, for record provenance.
    pub user: String,
    /// Path to the plan manifest JSON file.
    pub plan_manifest: PathBuf,
    /// Directory holding the taxonomy definition files.
    pub scheme_dir: PathBuf,
    /// Directory holding the coded files returned by the coding tool.
    pub coded_input_dir: PathBuf,
    /// Path to the auto-coded records JSONL file.
    pub input: PathBuf,
    /// Path to write the merged records JSONL file to.
    pub output: PathBuf,
    /// Taxonomy file of the correct-dataset (wrong-scheme) scheme,
    /// relative to the scheme directory. Enables wrong-scheme imputation.
    #[arg(long)]
    pub ws_scheme: Option<String>,
}

/// Run the manual-code merge stage.
pub fn cmd_apply_manual_codes(args: ApplyManualCodesArgs) -> Result<()> {
    let plans = PlanManifest::load(&args.plan_manifest)
        .with_context(|| format!("loading {}", args.plan_manifest.display()))?
        .resolve(&args.scheme_dir)?;
    let ws_scheme = args
        .ws_scheme
        .as_ref()
        .map(|file| CodeScheme::load(&args.scheme_dir.join(file)))
        .transpose()?;

    let mut records = jsonl::import_jsonl_file(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    for plan in plans.all() {
        let path = args.coded_input_dir.join(plan.coded_file());
        if !path.exists() {
            tracing::info!(
                plan = plan.raw_field(),
                path = %path.display(),
                "no coded file yet; keeping auto-codes"
            );
            continue;
        }
        let mut file = File::open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let messages = coda::read_coded_file(&mut file)
            .with_context(|| format!("parsing {}", path.display()))?;

        for cc in plan.coding_configurations() {
            coda::merge_coded_labels(&args.user, &mut records, plan, cc, &messages)?;
        }
        if let Some(ws) = &ws_scheme {
            coda::merge_ws_labels(&args.user, &mut records, plan, ws, &messages)?;
        }
    }

    if let Some(ws) = &ws_scheme {
        coda::impute_coding_errors(&args.user, &mut records, &plans, ws)?;
    }

    jsonl::export_jsonl_file(&records, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}
