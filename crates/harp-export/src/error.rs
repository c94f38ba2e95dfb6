//! # Export Errors

use thiserror::Error;

/// Errors from export orchestration and file writing.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A coded field covered by a plan was absent at materialization
    /// time. The coding phases guarantee every covered field resolves to
    /// a concrete code, so this is a stage-ordering or configuration bug.
    #[error("record {uid:?}: coded field {coded_field:?} is absent at export")]
    MissingCodedField {
        /// The respondent id of the offending record ("?" if unset).
        uid: String,
        /// The absent coded field.
        coded_field: String,
    },

    /// An engine phase failed (fold conflicts propagate through here).
    #[error(transparent)]
    Engine(#[from] harp_engine::EngineError),

    /// A scheme lookup failed (fatal; schemes are closed).
    #[error(transparent)]
    Scheme(#[from] harp_scheme::SchemeError),

    /// A core validation failure.
    #[error(transparent)]
    Core(#[from] harp_core::HarpError),

    /// IO error writing an output file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error in a stage file.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
