//! # Pipeline Configuration
//!
//! Run-wide settings loaded from a JSON file: platform key remappings,
//! project date range, and test-message filtering. Loaded once, validated,
//! and passed by reference into every stage — no ambient global lookup.

use std::fs;
use std::path::Path;

use harp_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// One platform-key → pipeline-key remapping.
///
/// Activation-message remappings are handled specially: the presence of
/// the platform key identifies which show a message answered, and the
/// value is re-materialized under the show's raw field rather than
/// copied key-for-key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRemapping {
    /// Whether this remapping identifies an activation (radio show)
    /// message rather than a survey answer.
    #[serde(default)]
    pub is_activation_message: bool,
    /// Key name in the messaging-platform export.
    pub platform_key: String,
    /// Key name used by the rest of the pipeline.
    pub pipeline_key: String,
}

/// Immutable run-wide configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    project_name: String,
    #[serde(default)]
    key_remappings: Vec<KeyRemapping>,
    project_start_date: Timestamp,
    project_end_date: Timestamp,
    #[serde(default)]
    test_contact_uuids: Vec<String>,
    filter_test_messages: bool,
}

impl PipelineConfig {
    /// Load and validate a pipeline configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a pipeline configuration from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, PlanError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.project_name.is_empty() {
            return Err(PlanError::InvalidPipelineConfig(
                "project_name must be non-empty".to_string(),
            ));
        }
        if self.project_start_date >= self.project_end_date {
            return Err(PlanError::InvalidPipelineConfig(format!(
                "project_start_date {} must precede project_end_date {}",
                self.project_start_date, self.project_end_date
            )));
        }
        for (i, remapping) in self.key_remappings.iter().enumerate() {
            if remapping.platform_key.is_empty() || remapping.pipeline_key.is_empty() {
                return Err(PlanError::InvalidPipelineConfig(format!(
                    "key_remappings[{i}] must have non-empty platform and pipeline keys"
                )));
            }
        }
        Ok(())
    }

    /// The project's name, used in logging and provenance.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Platform-key remappings in declaration order.
    pub fn key_remappings(&self) -> &[KeyRemapping] {
        &self.key_remappings
    }

    /// Start of data collection (inclusive).
    pub fn project_start_date(&self) -> Timestamp {
        self.project_start_date
    }

    /// End of data collection (exclusive).
    pub fn project_end_date(&self) -> Timestamp {
        self.project_end_date
    }

    /// Contact uuids whose messages are test traffic.
    pub fn test_contact_uuids(&self) -> &[String] {
        &self.test_contact_uuids
    }

    /// Whether test traffic is dropped before coding.
    pub fn filter_test_messages(&self) -> bool {
        self.filter_test_messages
    }
}
