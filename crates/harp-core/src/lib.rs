//! # harp-core — Foundational Types for the HARP Pipeline
//!
//! This crate is the bedrock of the HARP (Humanitarian Analysis of Radio
//! Participation) data pipeline. Every other crate in the workspace depends
//! on `harp-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`RespondentId`] and
//!    [`MessageId`] are distinct, validated types — no bare strings for
//!    identifiers that partition or key data.
//!
//! 2. **Single [`ControlCode`] enum.** One definition of the reserved code
//!    meanings (stop, not-coded, missing, coding-error, wrong-scheme),
//!    exhaustive `match` everywhere. Adding a control code forces every
//!    consumer to handle it.
//!
//! 3. **UTC-only timestamps.** The [`Timestamp`] type enforces UTC with Z
//!    suffix and seconds precision, so provenance and export values are
//!    deterministic across machines and timezones.
//!
//! 4. **Append-only records.** [`TracedRecord`] never overwrites in place:
//!    every mutation is an appended, provenance-tagged layer, giving a full
//!    audit lineage from raw platform export to analysis file.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `harp-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross a file boundary.

pub mod control;
pub mod error;
pub mod identity;
pub mod record;
pub mod temporal;
pub mod uuid_table;

// Re-export primary types for ergonomic imports.
pub use control::{ControlCode, AMBIVALENT, FALSE, MATRIX_0, MATRIX_1, TRUE};
pub use error::HarpError;
pub use identity::{MessageId, RespondentId};
pub use record::{Provenance, TracedRecord, UID_KEY};
pub use temporal::Timestamp;
pub use uuid_table::{InMemoryUuidTable, UuidTable};
