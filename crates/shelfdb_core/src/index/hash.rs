//! Hash index implementation.

use crate::document::DocumentId;
use crate::error::{CoreError, CoreResult};
use crate::index::definition::IndexSpec;
use crate::index::traits::{IndexKey, IndexStructure};
use std::collections::{HashMap, HashSet};

/// Hash-based index for O(1) equality lookups.
///
/// Backs both user hash indexes and the primary index. Iteration order of
/// [`IndexStructure::entries`] is unspecified.
pub struct HashIndex {
    /// Index specification.
    spec: IndexSpec,
    /// Key to document IDs mapping.
    entries: HashMap<IndexKey, HashSet<DocumentId>>,
    /// Total entry count.
    count: usize,
}

impl HashIndex {
    /// Creates a new hash index.
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: HashMap::new(),
            count: 0,
        }
    }
}

impl IndexStructure for HashIndex {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    fn insert(&mut self, key: IndexKey, document: DocumentId) -> CoreResult<()> {
        if self.spec.unique {
            if let Some(existing) = self.entries.get(&key) {
                if !existing.contains(&document) && !existing.is_empty() {
                    return Err(CoreError::DuplicateKey {
                        index: self.spec.handle.to_string(),
                        key: key.to_string(),
                    });
                }
            }
        }

        let set = self.entries.entry(key).or_default();
        if set.insert(document) {
            self.count += 1;
        }
        Ok(())
    }

    fn remove(&mut self, key: &IndexKey, document: DocumentId) -> bool {
        if let Some(set) = self.entries.get_mut(key) {
            if set.remove(&document) {
                self.count -= 1;
                if set.is_empty() {
                    self.entries.remove(key);
                }
                return true;
            }
        }
        false
    }

    fn lookup(&self, key: &IndexKey) -> Vec<DocumentId> {
        self.entries
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn contains(&self, key: &IndexKey) -> bool {
        self.entries.contains_key(key)
    }

    fn entries(&self) -> Vec<(IndexKey, DocumentId)> {
        self.entries
            .iter()
            .flat_map(|(key, documents)| documents.iter().map(move |d| (key.clone(), *d)))
            .collect()
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }
}
