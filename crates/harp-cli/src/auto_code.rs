//! # auto-code Subcommand
//!
//! Filters the record set down to the project's real traffic, applies
//! the automatic cleaners and the missing-data policy, derives message
//! ids, and writes the files human coders work from (coding files per
//! plan, ICR samples for plans that declare one).

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use harp_cleaners::CleanerRegistry;
use harp_engine::{auto_code, coda, filters};
use harp_export::icr::{export_icr_sample, ICR_MESSAGES_COUNT, ICR_SEED};
use harp_export::jsonl;
use harp_plan::{PipelineConfig, PlanManifest};

use crate::SENT_ON_KEY;

/// Arguments for the `harp auto-code` subcommand.
#[derive(Args, Debug)]
pub struct AutoCodeArgs {
    /// Identifier of the user running this stage, for record provenance.
    pub user: String,
    /// Path to the pipeline configuration JSON file.
    pub pipeline_configuration: PathBuf,
    /// Path to the plan manifest JSON file.
    pub plan_manifest: PathBuf,
    /// Directory holding the taxonomy definition files.
    pub scheme_dir: PathBuf,
    /// Path to the translated records JSONL file.
    pub input: PathBuf,
    /// Path to write the auto-coded records JSONL file to.
    pub output: PathBuf,
    /// Directory to write per-plan coding files to.
    pub coding_output_dir: PathBuf,
    /// Directory to write ICR sample CSVs to.
    pub icr_output_dir: PathBuf,
}

/// Run the auto-coding stage.
pub fn cmd_auto_code(args: AutoCodeArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.pipeline_configuration)
        .with_context(|| format!("loading {}", args.pipeline_configuration.display()))?;
    let plans = PlanManifest::load(&args.plan_manifest)
        .with_context(|| format!("loading {}", args.plan_manifest.display()))?
        .resolve(&args.scheme_dir)?;
    let registry = CleanerRegistry::with_default_cleaners();

    let mut records = jsonl::import_jsonl_file(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    // Filters: test traffic, runs answering no show, out-of-range times,
    // noise.
    if config.filter_test_messages() {
        records = filters::filter_test_messages(records);
    } else {
        tracing::info!("not filtering test messages (disabled in pipeline configuration)");
    }
    let rqa_raw_fields: Vec<String> = plans
        .rqa()
        .iter()
        .map(|plan| plan.raw_field().to_string())
        .collect();
    records = filters::filter_empty_messages(records, &rqa_raw_fields);
    records = filters::filter_time_range(
        records,
        SENT_ON_KEY,
        config.project_start_date(),
        config.project_end_date(),
    )?;

    // Automatic coding and the missing-data policy.
    auto_code::apply_cleaners(&args.user, &mut records, &plans, &registry)?;
    auto_code::apply_missing_policy(&args.user, &mut records, &plans)?;
    auto_code::apply_noise_policy(&args.user, &mut records, &plans)?;
    for plan in plans.all() {
        auto_code::compute_message_ids(&args.user, &mut records, plan)?;
    }

    // Export for manual coding: only non-noise messages go to coders.
    let for_coding = filters::filter_noise(records.clone());
    fs::create_dir_all(&args.coding_output_dir)?;
    for plan in plans.all() {
        let path = args.coding_output_dir.join(plan.coded_file());
        let mut writer = BufWriter::new(File::create(&path)?);
        coda::write_coding_file(&for_coding, plan, &mut writer)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    // ICR samples for the plans that declare one.
    fs::create_dir_all(&args.icr_output_dir)?;
    for plan in plans.all() {
        let Some(icr_file) = plan.icr_file() else {
            continue;
        };
        let path = args.icr_output_dir.join(icr_file);
        let mut writer = BufWriter::new(File::create(&path)?);
        export_icr_sample(&for_coding, plan, ICR_MESSAGES_COUNT, ICR_SEED, &mut writer)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    jsonl::export_jsonl_file(&records, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}
