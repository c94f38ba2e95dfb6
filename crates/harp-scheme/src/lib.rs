//! # harp-scheme — Code Scheme Taxonomies
//!
//! Implements the classification taxonomies every coded field is resolved
//! against:
//!
//! - **Code** (`code.rs`): one taxonomy entry — an export label, optional
//!   control meaning, and the free-text match values that resolve raw
//!   answers to the code.
//!
//! - **CodeScheme** (`scheme.rs`): a closed, immutable, validated set of
//!   codes for one classification dimension, with lookup by code id,
//!   control code, and match value. Loaded once per run from JSON taxonomy
//!   definition files.
//!
//! - **Label** (`label.rs`): an applied code — scheme, code id, origin,
//!   time, and whether a human verified it. Coded fields hold one label
//!   (single coding) or a list (multi coding).
//!
//! ## Crate Policy
//!
//! - Depends only on `harp-core` internally.
//! - Schemes expose no mutation after construction; every invariant is
//!   checked before the first record is processed.
//! - A failed lookup is a configuration/logic bug and carries the scheme
//!   and query in the error — it is never downgraded to a data-quality
//!   outcome.

pub mod code;
pub mod error;
pub mod label;
pub mod scheme;

pub use code::{Code, CodeType};
pub use error::SchemeError;
pub use label::Label;
pub use scheme::CodeScheme;
