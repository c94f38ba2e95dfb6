//! # harp-plan — Declarative Coding Configuration
//!
//! This crate is the configuration model that drives the coding-and-folding
//! engine: which raw fields exist, which schemes code them, under which
//! coding mode, and how each coded field folds when per-message records
//! collapse into per-respondent records.
//!
//! - **Modes** (`coding.rs`): the closed [`CodingMode`] and [`FoldMode`]
//!   enums. Fold dispatch happens by exhaustive `match` in the fold engine,
//!   nowhere else.
//!
//! - **CodingConfiguration** (`config.rs`): binds one scheme to one coded
//!   field; validates the mode pairing at construction.
//!
//! - **CodingPlan** (`plan.rs`): one raw field plus its configurations and
//!   round-trip metadata for the external coding tool.
//!
//! - **Plan manifest** (`manifest.rs`): the JSON file declaring a
//!   project's RQA and survey plans, resolved against a scheme directory
//!   at startup.
//!
//! - **PipelineConfig** (`pipeline.rs`): run-wide settings — key
//!   remappings, project dates, test-contact filtering.
//!
//! ## No Ambient State
//!
//! Configuration is constructed once per run, validated completely, and
//! passed by reference into every stage. Nothing in this crate is global
//! or mutable after load.

pub mod coding;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod plan;

pub use coding::{CodingMode, FoldMode};
pub use config::CodingConfiguration;
pub use error::PlanError;
pub use manifest::{PlanManifest, PlanSet};
pub use pipeline::{KeyRemapping, PipelineConfig};
pub use plan::CodingPlan;
