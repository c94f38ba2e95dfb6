//! # Uuid Table — Identity Anonymisation Interface
//!
//! The pipeline never sees raw phone numbers: the fetch layer exchanges
//! them for stable opaque uuids through a shared lookup table before data
//! enters the record set, and contact-list exports reverse the mapping at
//! the very end.
//!
//! That table lives in an external datastore owned by the fetch layer;
//! the core consumes it through the narrow [`UuidTable`] trait. The
//! in-memory implementation backs tests and local runs.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Bidirectional mapping between identifying values (phone numbers) and
/// stable opaque uuids.
pub trait UuidTable {
    /// Return the uuid for a value, allocating a new one on first sight.
    fn uuid_for_value(&mut self, value: &str) -> String;

    /// Resolve a batch of uuids back to their identifying values.
    /// Unknown uuids are omitted from the result.
    fn lookup_batch(&self, uuids: &[String]) -> BTreeMap<String, String>;

    /// Resolve a single identifying value to its uuid, if allocated.
    fn reverse(&self, value: &str) -> Option<String>;
}

/// In-memory [`UuidTable`] with a configurable uuid prefix.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUuidTable {
    prefix: String,
    value_to_uuid: BTreeMap<String, String>,
    uuid_to_value: BTreeMap<String, String>,
}

impl InMemoryUuidTable {
    /// Create an empty table. Allocated uuids are `{prefix}{uuid-v4}`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            value_to_uuid: BTreeMap::new(),
            uuid_to_value: BTreeMap::new(),
        }
    }

    /// Number of allocated mappings.
    pub fn len(&self) -> usize {
        self.value_to_uuid.len()
    }

    /// Whether the table has no mappings.
    pub fn is_empty(&self) -> bool {
        self.value_to_uuid.is_empty()
    }
}

impl UuidTable for InMemoryUuidTable {
    fn uuid_for_value(&mut self, value: &str) -> String {
        if let Some(existing) = self.value_to_uuid.get(value) {
            return existing.clone();
        }
        let uuid = format!("{}{}", self.prefix, Uuid::new_v4());
        self.value_to_uuid.insert(value.to_string(), uuid.clone());
        self.uuid_to_value.insert(uuid.clone(), value.to_string());
        uuid
    }

    fn lookup_batch(&self, uuids: &[String]) -> BTreeMap<String, String> {
        uuids
            .iter()
            .filter_map(|u| {
                self.uuid_to_value
                    .get(u)
                    .map(|v| (u.clone(), v.clone()))
            })
            .collect()
    }

    fn reverse(&self, value: &str) -> Option<String> {
        self.value_to_uuid.get(value).cloned()
    }
}
