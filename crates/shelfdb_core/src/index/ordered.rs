//! Ordered index implementation.

use crate::document::DocumentId;
use crate::error::{CoreError, CoreResult};
use crate::index::definition::IndexSpec;
use crate::index::traits::{IndexKey, IndexStructure};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// B-tree based index for ordered traversal and range scans.
///
/// Keys are kept in the storage order of [`crate::Value`]; documents under
/// one key are kept in id order, so scans are deterministic.
///
/// # Example
///
/// ```rust,ignore
/// let mut index = OrderedIndex::new(spec);
/// index.insert(IndexKey::single(25), document_id)?;
///
/// // Walk key groups from 18 upwards
/// let group = index.next_group(Bound::Included(&IndexKey::single(18)));
/// ```
pub struct OrderedIndex {
    /// Index specification.
    spec: IndexSpec,
    /// Ordered key to document IDs mapping.
    entries: BTreeMap<IndexKey, BTreeSet<DocumentId>>,
    /// Total entry count.
    count: usize,
}

impl OrderedIndex {
    /// Creates a new ordered index.
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: BTreeMap::new(),
            count: 0,
        }
    }

    /// Returns the first key group at or after `from`.
    ///
    /// This is the seek primitive of range scans: callers re-seek with
    /// `Bound::Excluded(last_key)` to step forward without holding a
    /// borrow across calls.
    pub fn next_group(&self, from: Bound<&IndexKey>) -> Option<(IndexKey, Vec<DocumentId>)> {
        self.entries
            .range::<IndexKey, _>((from, Bound::Unbounded))
            .next()
            .map(|(key, ids)| (key.clone(), ids.iter().copied().collect()))
    }

    /// Returns the minimum key.
    pub fn min_key(&self) -> Option<&IndexKey> {
        self.entries.keys().next()
    }

    /// Returns the maximum key.
    pub fn max_key(&self) -> Option<&IndexKey> {
        self.entries.keys().next_back()
    }
}

impl IndexStructure for OrderedIndex {
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
        let mut result = Vec::with_capacity(self.count);
        for (key, documents) in &self.entries {
            for document in documents {
                result.push((key.clone(), *document));
            }
        }
        result
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }

    fn as_ordered(&self) -> Option<&OrderedIndex> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::definition::IndexKind;
    use crate::index::handle::IndexHandle;
    use crate::types::{CollectionId, LocalIndexId};
    use crate::value::Value;

    fn test_spec() -> IndexSpec {
        IndexSpec::new(
            IndexHandle::new(CollectionId::new(1), LocalIndexId::new(1)),
            IndexKind::Ordered,
            vec!["age".into()],
        )
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = OrderedIndex::new(test_spec());
        let id = DocumentId::new();

        index.insert(IndexKey::single(25), id).unwrap();

        assert_eq!(index.lookup(&IndexKey::single(25)), vec![id]);
        assert!(index.lookup(&IndexKey::single(26)).is_empty());
    }

    #[test]
    fn next_group_walks_in_order() {
        let mut index = OrderedIndex::new(test_spec());
        for age in [30, 10, 50, 20, 40] {
            index.insert(IndexKey::single(age), DocumentId::new()).unwrap();
        }

        let mut seen = Vec::new();
        let mut from = Bound::Included(IndexKey::single(20));
        while let Some((key, ids)) = index.next_group(from.as_ref()) {
            assert_eq!(ids.len(), 1);
            seen.push(key.leading().clone());
            from = Bound::Excluded(key);
        }

        assert_eq!(
            seen,
            vec![Value::Integer(20), Value::Integer(30), Value::Integer(40), Value::Integer(50)]
        );
    }

    #[test]
    fn min_max_key() {
        let mut index = OrderedIndex::new(test_spec());
        for age in [30, 10, 50] {
            index.insert(IndexKey::single(age), DocumentId::new()).unwrap();
        }

        assert_eq!(index.min_key(), Some(&IndexKey::single(10)));
        assert_eq!(index.max_key(), Some(&IndexKey::single(50)));
    }

    #[test]
    fn remove_entry() {
        let mut index = OrderedIndex::new(test_spec());
        let id = DocumentId::new();

        index.insert(IndexKey::single(25), id).unwrap();
        assert!(index.contains(&IndexKey::single(25)));

        assert!(index.remove(&IndexKey::single(25), id));
        assert!(!index.contains(&IndexKey::single(25)));
        assert!(!index.remove(&IndexKey::single(25), id));
        assert!(index.is_empty());
    }

    #[test]
    fn unique_constraint() {
        let mut index = OrderedIndex::new(test_spec().unique());
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();

        index.insert(IndexKey::single(25), id1).unwrap();
        index.insert(IndexKey::single(25), id1).unwrap();
        assert_eq!(index.len(), 1);

        let err = index.insert(IndexKey::single(25), id2).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { ref index, .. } if index == "1/1"));
    }

    #[test]
    fn non_unique_keeps_both() {
        let mut index = OrderedIndex::new(test_spec());
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();

        index.insert(IndexKey::single(25), id1).unwrap();
        index.insert(IndexKey::single(25), id2).unwrap();

        let found = index.lookup(&IndexKey::single(25));
        assert_eq!(found.len(), 2);
        assert!(found.contains(&id1) && found.contains(&id2));
        assert_eq!(index.entries().len(), 2);
    }
}
