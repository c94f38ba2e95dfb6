//! # harp-cli — HARP Pipeline Command-Line Interface
//!
//! One subcommand per pipeline stage, run in order:
//!
//! - `translate-keys` — platform keys → pipeline keys.
//! - `auto-code` — filters, cleaners, missing-data policy, message ids,
//!   coding-file and ICR exports.
//! - `apply-manual-codes` — merge the external coding tool's verified
//!   labels, wrong-scheme imputation.
//! - `analysis-file` — fold and export the by-message/by-respondent CSVs.
//!
//! Stages pass record sets to each other as JSONL files, so any stage's
//! output can be inspected or re-fed. A fatal error (fold conflict,
//! malformed configuration) exits non-zero with the diagnostic on
//! stderr; the pipeline is designed to be re-run in full after the
//! upstream fix.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the domain crates — no engine logic here.

pub mod analysis;
pub mod auto_code;
pub mod manual_codes;
pub mod translate;

/// Record key carrying the platform's message sent-on time.
pub const SENT_ON_KEY: &str = "sent_on";
