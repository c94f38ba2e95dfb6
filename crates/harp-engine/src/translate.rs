//! # Key Translation — Platform Keys to Pipeline Keys
//!
//! Messaging-platform exports name their value keys after flow variables;
//! the pipeline works with stable keys declared in the pipeline
//! configuration. This stage runs before anything else touches the
//! records:
//!
//! 1. Identify which show each activation message answered from the
//!    presence of its platform value key, recording the answer under the
//!    working keys `rqa_message` / `show_pipeline_key`.
//! 2. Copy non-activation platform keys to their pipeline keys (never
//!    overwriting a pipeline key that is already present).
//! 3. Re-materialize each show's raw field from the working keys, since
//!    downstream phases select radio-show messages by raw-field presence.
//!
//! Because records are append-only, the platform keys stay in the layer
//! history; translation adds pipeline keys rather than renaming.

use std::collections::BTreeMap;

use harp_core::{Provenance, TracedRecord};
use harp_plan::PipelineConfig;
use serde_json::Value;

use crate::error::EngineError;

const CALL_SITE: &str = "harp_engine::translate";

/// Working key holding an activation message's answer text.
const RQA_MESSAGE_KEY: &str = "rqa_message";
/// Working key holding the pipeline key of the show a message answered.
const SHOW_PIPELINE_KEY: &str = "show_pipeline_key";

/// Assign each activation message its show from platform-key presence.
///
/// # Errors
///
/// [`EngineError::AmbiguousActivationMessage`] if a record carries two
/// activation platform keys — which show it answered would be a guess.
pub fn set_show_ids(
    user: &str,
    records: &mut [TracedRecord],
    config: &PipelineConfig,
) -> Result<(), EngineError> {
    for (position, record) in records.iter_mut().enumerate() {
        // (platform key, pipeline key, answer text) of the matched show.
        let mut matched: Option<(String, String, Value)> = None;
        for remapping in config.key_remappings() {
            if !remapping.is_activation_message {
                continue;
            }
            let Some(value) = record.get(&remapping.platform_key) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if let Some((first, _, _)) = &matched {
                return Err(EngineError::AmbiguousActivationMessage {
                    position,
                    first: first.clone(),
                    second: remapping.platform_key.clone(),
                });
            }
            matched = Some((
                remapping.platform_key.clone(),
                remapping.pipeline_key.clone(),
                value.clone(),
            ));
        }

        if let Some((_, pipeline_key, value)) = matched {
            let mut data = BTreeMap::new();
            data.insert(RQA_MESSAGE_KEY.to_string(), value);
            data.insert(SHOW_PIPELINE_KEY.to_string(), Value::String(pipeline_key));
            record.append_data(data, Provenance::new(user, CALL_SITE));
        }
    }
    Ok(())
}

/// Copy non-activation platform keys to their pipeline keys. A pipeline
/// key already present wins; the first remapping for a key wins after
/// that.
pub fn remap_key_names(user: &str, records: &mut [TracedRecord], config: &PipelineConfig) {
    for record in records.iter_mut() {
        let mut remapped: BTreeMap<String, Value> = BTreeMap::new();
        for remapping in config.key_remappings() {
            if remapping.is_activation_message {
                continue;
            }
            if record.contains_key(&remapping.pipeline_key)
                || remapped.contains_key(&remapping.pipeline_key)
            {
                continue;
            }
            match record.get(&remapping.platform_key) {
                Some(value) if !value.is_null() => {
                    remapped.insert(remapping.pipeline_key.clone(), value.clone());
                }
                _ => {}
            }
        }
        record.append_data(remapped, Provenance::new(user, CALL_SITE));
    }
}

/// Re-materialize each show's raw field from the working keys, so that
/// downstream phases can keep selecting radio-show messages by raw-field
/// presence.
pub fn set_rqa_raw_keys_from_show_ids(user: &str, records: &mut [TracedRecord]) {
    for record in records.iter_mut() {
        let Some(show_key) = record.get_str(SHOW_PIPELINE_KEY).map(str::to_string) else {
            continue;
        };
        let Some(message) = record.get(RQA_MESSAGE_KEY).cloned() else {
            continue;
        };
        record.append_one(show_key, message, Provenance::new(user, CALL_SITE));
    }
}

/// The full translation stage, in order.
pub fn translate_keys(
    user: &str,
    records: &mut [TracedRecord],
    config: &PipelineConfig,
) -> Result<(), EngineError> {
    set_show_ids(user, records, config)?;
    remap_key_names(user, records, config);
    set_rqa_raw_keys_from_show_ids(user, records);
    tracing::info!(records = records.len(), "translated platform keys");
    Ok(())
}
