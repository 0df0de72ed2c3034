//! Index registry - the set of indexes of one collection.
//!
//! The registry owns every index of a collection, allocates local ids, keeps
//! all indexes in step with document writes, and picks an index for each
//! query.
//!
//! # Invariants
//!
//! - Exactly one primary index exists, with local id `0`, on `_id`
//! - Local ids are allocated monotonically and never reused
//! - A write is applied to every index or to none
//! - The registry lock is never held during a scan

use crate::document::{Document, DocumentStore};
use crate::error::{CoreError, CoreResult};
use crate::index::definition::{IndexDescriptor, IndexKind, IndexSpec};
use crate::index::handle::{IndexHandle, IndexRef};
use crate::index::instance::Index;
use crate::index::traits::IndexKey;
use crate::predicate::Range;
use crate::types::{CollectionId, LocalIndexId};
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Key path of the primary index.
pub const PRIMARY_KEY_PATH: &str = "_id";

/// Statistics about index usage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of queries served by an index.
    pub lookups: u64,
    /// Number of queries that fell back to a full document scan.
    pub full_scans: u64,
    /// Number of index entries written or removed.
    pub updates: u64,
}

/// The indexes of one collection.
pub struct IndexRegistry {
    /// Owning collection.
    collection: CollectionId,
    /// Indexes keyed by local id.
    indexes: RwLock<BTreeMap<LocalIndexId, Arc<Index>>>,
    /// Next local id to assign.
    next_local_id: AtomicU64,
    /// Statistics.
    stats: RwLock<IndexStats>,
}

impl IndexRegistry {
    /// Creates a registry holding only the primary index.
    #[must_use]
    pub fn new(collection: CollectionId) -> Self {
        let primary = IndexSpec::new(
            IndexHandle::new(collection, LocalIndexId::PRIMARY),
            IndexKind::Primary,
            vec![PRIMARY_KEY_PATH.to_string()],
        )
        .unique();

        let mut indexes = BTreeMap::new();
        indexes.insert(LocalIndexId::PRIMARY, Arc::new(Index::new(primary)));

        Self {
            collection,
            indexes: RwLock::new(indexes),
            next_local_id: AtomicU64::new(1),
            stats: RwLock::new(IndexStats::default()),
        }
    }

    /// Returns the owning collection id.
    pub fn collection_id(&self) -> CollectionId {
        self.collection
    }

    /// Returns the primary index, if the registry has not been released.
    pub fn primary(&self) -> Option<Arc<Index>> {
        self.get(LocalIndexId::PRIMARY)
    }

    /// Creates an index, fills it from the store and registers it.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` for the primary kind or an empty key path list
    /// - `DuplicateIndexDefinition` if a unique index on the same key paths
    ///   exists
    /// - `DuplicateKey` if a unique index cannot be filled; nothing is
    ///   registered in that case
    pub fn create(
        &self,
        kind: IndexKind,
        key_paths: Vec<String>,
        unique: bool,
        store: &dyn DocumentStore,
    ) -> CoreResult<Arc<Index>> {
        if kind == IndexKind::Primary {
            return Err(CoreError::invalid_operation(
                "the primary index is created with the collection",
            ));
        }
        if key_paths.is_empty() || key_paths.iter().any(String::is_empty) {
            return Err(CoreError::invalid_operation(
                "an index needs at least one non-empty key path",
            ));
        }
        if unique {
            self.check_unique_definition(&key_paths)?;
        }

        let local = LocalIndexId::new(self.next_local_id.fetch_add(1, Ordering::SeqCst));
        let mut spec = IndexSpec::new(IndexHandle::new(self.collection, local), kind, key_paths);
        if unique {
            spec = spec.unique();
        }

        let index = Arc::new(Index::new(spec));
        index.rebuild(load_documents(store)?)?;

        {
            let mut indexes = self.indexes.write();
            if unique {
                if let Some(existing) = find_unique(&indexes, index.key_paths()) {
                    return Err(duplicate_definition(index.key_paths(), &existing));
                }
            }
            indexes.insert(local, Arc::clone(&index));
        }

        debug!(
            index = %index.handle(),
            kind = %kind,
            fields = ?index.key_paths(),
            unique,
            size = index.len(),
            "created index"
        );
        Ok(index)
    }

    fn check_unique_definition(&self, key_paths: &[String]) -> CoreResult<()> {
        match find_unique(&self.indexes.read(), key_paths) {
            Some(existing) => Err(duplicate_definition(key_paths, &existing)),
            None => Ok(()),
        }
    }

    /// Returns the index with an identical definition, if one exists.
    pub fn find_definition(
        &self,
        kind: IndexKind,
        key_paths: &[String],
        unique: bool,
    ) -> Option<Arc<Index>> {
        self.indexes
            .read()
            .values()
            .find(|index| {
                index.kind() == kind && index.is_unique() == unique && index.key_paths() == key_paths
            })
            .cloned()
    }

    /// Gets an index by local id.
    pub fn get(&self, local: LocalIndexId) -> Option<Arc<Index>> {
        self.indexes.read().get(&local).cloned()
    }

    /// Finds an index by handle.
    ///
    /// # Errors
    ///
    /// - `MalformedIndexHandle` if the text does not start with
    ///   `<digits>/<digits>`
    /// - `CollectionNotFound` if the collection part names another
    ///   collection
    pub fn find(&self, reference: &IndexRef) -> CoreResult<Option<Arc<Index>>> {
        let parsed = reference.parse()?;
        if parsed.collection != self.collection {
            return Err(CoreError::collection_not_found(parsed.collection.to_string()));
        }
        Ok(parsed.handle().and_then(|handle| self.get(handle.local())))
    }

    /// Drops an index by handle.
    ///
    /// Returns `false` if no such index exists.
    ///
    /// # Errors
    ///
    /// As [`IndexRegistry::find`], plus `IndexProtected` for the primary.
    pub fn drop_index(&self, reference: &IndexRef) -> CoreResult<bool> {
        match self.find(reference)? {
            Some(index) => self.remove(index.handle()),
            None => Ok(false),
        }
    }

    /// Drops an index by exact handle.
    pub(crate) fn remove(&self, handle: IndexHandle) -> CoreResult<bool> {
        if handle.is_primary() {
            return Err(CoreError::IndexProtected {
                id: handle.to_string(),
            });
        }
        let removed = self.indexes.write().remove(&handle.local());
        match removed {
            Some(index) => {
                index.drop_index()?;
                debug!(index = %handle, "dropped index");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns all indexes ordered by local id.
    pub fn all(&self) -> Vec<Arc<Index>> {
        self.indexes.read().values().cloned().collect()
    }

    /// Returns descriptors of all indexes ordered by local id.
    pub fn descriptors(&self) -> Vec<IndexDescriptor> {
        self.all().iter().map(|index| index.descriptor()).collect()
    }

    /// Returns the number of registered indexes, primary included.
    pub fn len(&self) -> usize {
        self.indexes.read().len()
    }

    /// Returns true once the registry has been released.
    pub fn is_empty(&self) -> bool {
        self.indexes.read().is_empty()
    }

    /// Picks the index that serves `field` within `range` best.
    ///
    /// Candidates have `field` as their first key path and support the
    /// range. Unique indexes win, then single-key-path ones, then hash
    /// structures for `==`, then the oldest. Returns `None` when only a
    /// full scan can answer; both outcomes are counted in the stats.
    pub fn select_for(&self, field: &str, range: &Range) -> Option<Arc<Index>> {
        let point = range.is_point();
        let selected = self
            .indexes
            .read()
            .values()
            .filter(|index| index.key_paths().first().map(String::as_str) == Some(field))
            .filter(|index| index.supports(range))
            .max_by_key(|index| {
                (
                    index.is_unique(),
                    index.key_paths().len() == 1,
                    point && !index.kind().is_ordered(),
                    Reverse(index.handle().local()),
                )
            })
            .cloned();

        let mut stats = self.stats.write();
        match &selected {
            Some(index) => {
                stats.lookups += 1;
                debug!(field, range = %range, index = %index.handle(), "selected index");
            }
            None => {
                stats.full_scans += 1;
                debug!(field, range = %range, "no usable index, scanning documents");
            }
        }
        selected
    }

    /// Adds a new document to every index.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` from a unique index. Entries already written for the
    /// document are rolled back first.
    pub fn index_document(&self, document: &Document) -> CoreResult<()> {
        let indexes = self.all();
        let mut written: Vec<(&Arc<Index>, IndexKey)> = Vec::with_capacity(indexes.len());

        for index in &indexes {
            let Some(key) = index.key_for(document) else {
                continue;
            };
            if let Err(err) = index.insert(key.clone(), document.id()) {
                for (index, key) in written {
                    index.remove(&key, document.id());
                }
                return Err(err);
            }
            written.push((index, key));
        }

        self.stats.write().updates += written.len() as u64;
        Ok(())
    }

    /// Removes a document from every index.
    pub fn unindex_document(&self, document: &Document) {
        let mut removed = 0u64;
        for index in self.all() {
            if let Some(key) = index.key_for(document) {
                if index.remove(&key, document.id()) {
                    removed += 1;
                }
            }
        }
        self.stats.write().updates += removed;
    }

    /// Moves a document from its old keys to its new ones.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` from a unique index; the old entries are restored.
    pub fn reindex_document(&self, old: &Document, new: &Document) -> CoreResult<()> {
        self.unindex_document(old);
        if let Err(err) = self.index_document(new) {
            self.index_document(old)?;
            return Err(err);
        }
        Ok(())
    }

    /// Clears every index, keeping definitions.
    pub fn clear_entries(&self) {
        for index in self.all() {
            index.clear();
        }
    }

    /// Rebuilds every index from the store.
    ///
    /// # Errors
    ///
    /// Store faults, or `DuplicateKey` if the stored documents violate a
    /// unique index. Indexes rebuilt before the failure keep their new
    /// contents.
    pub fn rebuild(&self, store: &dyn DocumentStore) -> CoreResult<()> {
        let documents = load_documents(store)?;
        for index in self.all() {
            index.rebuild(documents.iter().cloned())?;
        }
        Ok(())
    }

    /// Drops every index, the primary included.
    pub(crate) fn release(&self) {
        let released = std::mem::take(&mut *self.indexes.write());
        for index in released.values() {
            index.clear();
        }
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> IndexStats {
        *self.stats.read()
    }
}

impl std::fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("collection", &self.collection)
            .field("indexes", &self.indexes.read().len())
            .finish_non_exhaustive()
    }
}

fn find_unique(
    indexes: &BTreeMap<LocalIndexId, Arc<Index>>,
    key_paths: &[String],
) -> Option<IndexHandle> {
    indexes
        .values()
        .find(|index| index.is_unique() && index.key_paths() == key_paths)
        .map(|index| index.handle())
}

fn duplicate_definition(key_paths: &[String], existing: &IndexHandle) -> CoreError {
    CoreError::DuplicateIndexDefinition {
        key_paths: key_paths.to_vec(),
        existing: existing.to_string(),
    }
}

fn load_documents(store: &dyn DocumentStore) -> CoreResult<Vec<Document>> {
    let mut documents = Vec::with_capacity(store.len());
    for id in store.all_ids()? {
        if let Some(document) = store.get(id)? {
            documents.push(document);
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentId, MemoryDocumentStore};
    use crate::error::ErrorKind;
    use crate::predicate::{eq, range};
    use crate::value::Value;

    fn registry() -> IndexRegistry {
        IndexRegistry::new(CollectionId::new(100))
    }

    fn doc(age: i64) -> Document {
        Document::new(DocumentId::new(), Value::object([("age", age)]))
    }

    fn paths(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn starts_with_primary() {
        let registry = registry();
        let primary = registry.primary().unwrap();
        assert_eq!(primary.handle().to_string(), "100/0");
        assert!(primary.is_unique());
        assert_eq!(primary.key_paths(), &["_id".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn create_allocates_ids_and_backfills() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        let d = doc(5);
        store.insert(d.clone()).unwrap();

        let ordered = registry
            .create(IndexKind::Ordered, paths(&["age"]), false, &store)
            .unwrap();
        let hash = registry
            .create(IndexKind::Hash, paths(&["age"]), false, &store)
            .unwrap();

        assert_eq!(ordered.handle().to_string(), "100/1");
        assert_eq!(hash.handle().to_string(), "100/2");
        assert_eq!(ordered.lookup(eq(5)).to_vec().unwrap(), vec![d.id()]);
    }

    #[test]
    fn create_rejects_primary_kind() {
        let err = registry()
            .create(IndexKind::Primary, paths(&["age"]), true, &MemoryDocumentStore::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn duplicate_unique_definition() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        registry
            .create(IndexKind::Hash, paths(&["email"]), true, &store)
            .unwrap();

        let err = registry
            .create(IndexKind::Ordered, paths(&["email"]), true, &store)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateIndexDefinition {
                key_paths: paths(&["email"]),
                existing: "100/1".into()
            }
        );

        // Non-unique duplicates are allowed.
        registry
            .create(IndexKind::Ordered, paths(&["email"]), false, &store)
            .unwrap();
    }

    #[test]
    fn failed_backfill_registers_nothing() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        store.insert(doc(5)).unwrap();
        store.insert(doc(5)).unwrap();

        let err = registry
            .create(IndexKind::Ordered, paths(&["age"]), true, &store)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn find_and_drop() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        registry
            .create(IndexKind::Ordered, paths(&["age"]), false, &store)
            .unwrap();

        assert!(registry.find(&"100/1".into()).unwrap().is_some());
        assert!(registry.find(&"100/9".into()).unwrap().is_none());
        assert!(registry.find(&"100/1x".into()).unwrap().is_none());
        assert_eq!(
            registry.find(&"abc".into()).unwrap_err().kind(),
            ErrorKind::MalformedIndexHandle
        );
        assert_eq!(
            registry.find(&"7/1".into()).unwrap_err().kind(),
            ErrorKind::CollectionNotFound
        );

        assert_eq!(
            registry.drop_index(&"100/0".into()).unwrap_err().kind(),
            ErrorKind::IndexProtected
        );
        assert!(registry.drop_index(&"100/1".into()).unwrap());
        assert!(!registry.drop_index(&"100/1".into()).unwrap());
        assert!(registry.find(&"100/1".into()).unwrap().is_none());
    }

    #[test]
    fn local_ids_are_not_reused() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        let first = registry
            .create(IndexKind::Ordered, paths(&["age"]), false, &store)
            .unwrap();
        registry.remove(first.handle()).unwrap();

        let second = registry
            .create(IndexKind::Ordered, paths(&["age"]), false, &store)
            .unwrap();
        assert_eq!(second.handle().local(), LocalIndexId::new(2));
    }

    #[test]
    fn selection_preferences() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        let compound = registry
            .create(IndexKind::Ordered, paths(&["age", "name"]), false, &store)
            .unwrap();
        assert_eq!(
            registry.select_for("age", &range(1, 2)).map(|i| i.handle()),
            Some(compound.handle())
        );

        let ordered = registry
            .create(IndexKind::Ordered, paths(&["age"]), false, &store)
            .unwrap();
        assert_eq!(
            registry.select_for("age", &range(1, 2)).map(|i| i.handle()),
            Some(ordered.handle())
        );

        let hash = registry
            .create(IndexKind::Hash, paths(&["age"]), false, &store)
            .unwrap();
        assert_eq!(
            registry.select_for("age", &eq(1)).map(|i| i.handle()),
            Some(hash.handle())
        );
        assert_eq!(
            registry.select_for("age", &range(1, 2)).map(|i| i.handle()),
            Some(ordered.handle())
        );

        let unique = registry
            .create(IndexKind::Ordered, paths(&["age"]), true, &store)
            .unwrap();
        assert_eq!(
            registry.select_for("age", &eq(1)).map(|i| i.handle()),
            Some(unique.handle())
        );

        assert!(registry.select_for("name", &eq("x")).is_none());
        let stats = registry.stats();
        assert_eq!(stats.lookups, 5);
        assert_eq!(stats.full_scans, 1);
    }

    #[test]
    fn primary_serves_id_lookups() {
        let registry = registry();
        let d = doc(1);
        registry.index_document(&d).unwrap();

        let primary = registry.select_for("_id", &eq(d.id().to_value())).unwrap();
        assert!(primary.is_primary());
        assert_eq!(primary.lookup(eq(d.id().to_value())).to_vec().unwrap(), vec![d.id()]);
    }

    #[test]
    fn failed_write_rolls_back() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        let ordered = registry
            .create(IndexKind::Ordered, paths(&["age"]), false, &store)
            .unwrap();
        registry
            .create(IndexKind::Hash, paths(&["age"]), true, &store)
            .unwrap();

        registry.index_document(&doc(5)).unwrap();
        let clash = doc(5);
        assert!(registry.index_document(&clash).is_err());

        assert_eq!(ordered.len(), 1);
        let primary = registry.primary().unwrap();
        assert!(!primary.contains(&IndexKey::single(clash.id().to_value())));
    }

    #[test]
    fn reindex_restores_on_failure() {
        let registry = registry();
        let store = MemoryDocumentStore::new();
        let unique = registry
            .create(IndexKind::Ordered, paths(&["age"]), true, &store)
            .unwrap();

        let a = doc(1);
        let b = doc(2);
        registry.index_document(&a).unwrap();
        registry.index_document(&b).unwrap();

        let moved = Document::new(b.id(), Value::object([("age", 1)]));
        assert!(registry.reindex_document(&b, &moved).is_err());
        assert_eq!(unique.lookup(eq(2)).to_vec().unwrap(), vec![b.id()]);

        let moved = Document::new(b.id(), Value::object([("age", 3)]));
        registry.reindex_document(&b, &moved).unwrap();
        assert_eq!(unique.lookup(eq(3)).to_vec().unwrap(), vec![b.id()]);
        assert!(unique.lookup(eq(2)).to_vec().unwrap().is_empty());
    }

    #[test]
    fn release_drops_everything() {
        let registry = registry();
        registry.index_document(&doc(1)).unwrap();
        registry.release();
        assert!(registry.is_empty());
        assert!(registry.primary().is_none());
    }
}
