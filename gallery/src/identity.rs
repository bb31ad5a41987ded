use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label reported when no identity matches. Enrolling under this exact name
/// is rejected so a match can never be mistaken for a non-match.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Metadata stored alongside one enrolled embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Insertion position of the embedding. Never reused.
    pub index_id: usize,

    /// Identity label returned on a match.
    pub name: String,

    /// Free-form key-value metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Tombstone. Revoked records stay in the gallery but never match.
    #[serde(default, skip_serializing_if = "is_false")]
    pub revoked: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One embedding to enroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub name: String,
    pub vector: Vec<f32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Enrollment {
    pub fn new(name: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            vector,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds one attribute, replacing any previous value for `key`.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
