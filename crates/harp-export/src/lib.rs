//! # harp-export — Analysis Exports
//!
//! The last mile of the pipeline:
//!
//! - **Analysis orchestration** (`analysis.rs`): materializes export
//!   values from coded labels, runs consent detection, folds per-message
//!   records into per-respondent records, applies the matrix fixups,
//!   propagates stop codes, and writes both tabular outputs with one
//!   shared header list.
//! - **CSV** (`csv.rs`): the tabular writer (string-only cells, stable
//!   header row).
//! - **JSONL** (`jsonl.rs`): traced-record persistence between pipeline
//!   stages, layer history included.
//! - **ICR** (`icr.rs`): deterministic random samples for inter-coder
//!   reliability review.

pub mod analysis;
pub mod csv;
pub mod error;
pub mod icr;
pub mod jsonl;

pub use analysis::{build_fold_spec, export_keys, generate_analysis_files, AnalysisOutput};
pub use error::ExportError;
