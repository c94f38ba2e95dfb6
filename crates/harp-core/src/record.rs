//! # Traced Records — Append-Only Layered Data
//!
//! [`TracedRecord`] is the unit of data flowing through every pipeline
//! phase: one record per message before folding, one per respondent after.
//!
//! A record is an ordered, append-only sequence of key→value layers.
//! Later layers shadow earlier ones for the same key; keys are never
//! deleted, only shadowed or explicitly hidden by a tombstone layer.
//! Every mutation appends a layer tagged with [`Provenance`] — who wrote
//! it, from where, and when — so the full lineage from raw platform
//! export to analysis file can be replayed.
//!
//! Reads resolve a key by scanning layers newest-first. The cost is
//! linear in layer count, which is bounded by the (small, fixed) number
//! of pipeline phases that touch a record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::temporal::Timestamp;

/// The key every record must carry to participate in folding.
pub const UID_KEY: &str = "uid";

/// Who appended a layer, from which call site, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the user running the pipeline stage.
    pub user: String,
    /// Code location that performed the append (module path or similar).
    pub call_site: String,
    /// When the layer was appended.
    pub timestamp: Timestamp,
}

impl Provenance {
    /// Create a provenance entry stamped with the current time.
    pub fn new(user: impl Into<String>, call_site: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            call_site: call_site.into(),
            timestamp: Timestamp::now(),
        }
    }

    /// Create a provenance entry with an explicit timestamp.
    pub fn at(
        user: impl Into<String>,
        call_site: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            user: user.into(),
            call_site: call_site.into(),
            timestamp,
        }
    }
}

/// One slot in a layer: either a value or a tombstone hiding the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Entry {
    /// A (possibly shadowing) value for the key.
    Value(Value),
    /// The key is hidden from this layer onward. Prior layers keep their
    /// values for audit; reads resolve to absent.
    Hidden,
}

/// One append-only mutation: a batch of key entries plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    entries: BTreeMap<String, Entry>,
    provenance: Provenance,
}

impl Layer {
    /// The provenance of this layer.
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// The keys written (or hidden) by this layer.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// An ordered, append-only sequence of provenance-tagged layers.
///
/// Records serialize to one JSON object per line in the stage files the
/// CLI passes between pipeline phases, preserving full layer history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedRecord {
    layers: Vec<Layer>,
}

impl TracedRecord {
    /// Create a record from an initial data layer.
    pub fn new(data: BTreeMap<String, Value>, provenance: Provenance) -> Self {
        let entries = data.into_iter().map(|(k, v)| (k, Entry::Value(v))).collect();
        Self {
            layers: vec![Layer { entries, provenance }],
        }
    }

    /// Append a batch of key→value pairs as one new layer.
    ///
    /// An empty batch appends nothing; a no-op mutation leaves no audit
    /// entry to misread.
    pub fn append_data(&mut self, data: BTreeMap<String, Value>, provenance: Provenance) {
        if data.is_empty() {
            return;
        }
        let entries = data.into_iter().map(|(k, v)| (k, Entry::Value(v))).collect();
        self.layers.push(Layer { entries, provenance });
    }

    /// Append a single key→value pair as one new layer.
    pub fn append_one(
        &mut self,
        key: impl Into<String>,
        value: Value,
        provenance: Provenance,
    ) {
        let mut data = BTreeMap::new();
        data.insert(key.into(), value);
        self.append_data(data, provenance);
    }

    /// Hide keys behind a tombstone layer. Prior values remain in the
    /// layer history; reads resolve the keys to absent.
    pub fn hide(&mut self, keys: &[&str], provenance: Provenance) {
        if keys.is_empty() {
            return;
        }
        let entries = keys
            .iter()
            .map(|k| ((*k).to_string(), Entry::Hidden))
            .collect();
        self.layers.push(Layer { entries, provenance });
    }

    /// Resolve a key, scanning layers newest-first.
    pub fn get(&self, key: &str) -> Option<&Value> {
        for layer in self.layers.iter().rev() {
            match layer.entries.get(key) {
                Some(Entry::Value(v)) => return Some(v),
                Some(Entry::Hidden) => return None,
                None => continue,
            }
        }
        None
    }

    /// Resolve a key to a string slice, if present and a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Whether the key resolves to a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The record's respondent identifier, if set.
    pub fn uid(&self) -> Option<&str> {
        self.get_str(UID_KEY)
    }

    /// All keys that currently resolve to a value (hidden keys excluded).
    pub fn keys(&self) -> BTreeSet<&str> {
        let mut visible = BTreeSet::new();
        let mut hidden = BTreeSet::new();
        for layer in self.layers.iter().rev() {
            for (key, entry) in &layer.entries {
                let key = key.as_str();
                if visible.contains(key) || hidden.contains(key) {
                    continue;
                }
                match entry {
                    Entry::Value(_) => {
                        visible.insert(key);
                    }
                    Entry::Hidden => {
                        hidden.insert(key);
                    }
                }
            }
        }
        visible
    }

    /// The full layer history, oldest first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The provenance of the layer that most recently wrote (or hid) the
    /// given key.
    pub fn provenance_for(&self, key: &str) -> Option<&Provenance> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.entries.contains_key(key))
            .map(|layer| &layer.provenance)
    }
}
