//! # harp-engine — The Coding-and-Folding Engine
//!
//! The pipeline phases that transform a loaded record set, in the order
//! the exporter runs them:
//!
//! 1. **Key translation** (`translate.rs`): platform keys → pipeline keys,
//!    show identification for activation messages.
//! 2. **Filters** (`filters.rs`): test traffic, empty runs, out-of-range
//!    times, noise.
//! 3. **Auto-coding** (`auto_code.rs`): cleaners, the missing-data policy,
//!    deterministic message ids.
//! 4. **Manual-code import** (`coda.rs`): merging the external coding
//!    tool's verified labels, wrong-scheme imputation.
//! 5. **Consent** (`consent.rs`): stop-code detection and propagation.
//! 6. **Fold** (`fold.rs`): the per-message → per-respondent merge with
//!    per-key conflict policy. The core algorithm of the repository.
//!
//! Phases mutate the in-memory record set in place (each mutation an
//! appended, provenance-tagged layer) and must run in the documented
//! order: fold assumes consent detection has already labelled
//! withdrawal, and the exporter's matrix fixups assume folding is done.
//!
//! ## Failure Semantics
//!
//! Fold consistency violations and scheme lookup misses are fatal and
//! propagate out of the engine untouched; nothing here downgrades an
//! error to a warning.

pub mod auto_code;
pub mod coda;
pub mod consent;
pub mod error;
pub mod filters;
pub mod fold;
pub mod translate;

pub use error::EngineError;
pub use fold::{fold_records, FoldSpec};
