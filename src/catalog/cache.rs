//! Signature cache reused across extraction runs
//!
//! Entries are keyed by object id and checked against the input fingerprint,
//! so an edited routine is always extracted again.

use std::collections::HashMap;

use crate::model::RoutineSignature;

/// Caller-owned store of previously extracted signatures, keyed by object id.
///
/// An entry is only reused while its fingerprint matches the current inputs.
#[derive(Debug, Clone, Default)]
pub struct SignatureCache {
    entries: HashMap<i64, RoutineSignature>,
}

impl SignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached signature for `object_id` if it was built from the same inputs.
    pub fn get_fresh(&self, object_id: i64, fingerprint: &str) -> Option<&RoutineSignature> {
        self.entries
            .get(&object_id)
            .filter(|s| s.fingerprint == fingerprint)
    }

    /// Seed a cache from signatures written by an earlier run.
    pub fn from_signatures(signatures: Vec<RoutineSignature>) -> Self {
        let mut cache = Self::new();
        for signature in signatures {
            cache.insert(signature);
        }
        cache
    }

    /// Cached signatures in object id order
    pub fn signatures(&self) -> Vec<&RoutineSignature> {
        let mut signatures: Vec<&RoutineSignature> = self.entries.values().collect();
        signatures.sort_by_key(|s| s.object_id);
        signatures
    }

    pub fn insert(&mut self, signature: RoutineSignature) {
        self.entries.insert(signature.object_id, signature);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
