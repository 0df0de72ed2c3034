//! State shared by every collection kind.

use crate::collection::query::{QueryCursor, QueryPlan};
use crate::collection::status::CollectionStatus;
use crate::config::{Config, TruncateMode};
use crate::document::{Document, DocumentId, DocumentStore};
use crate::error::{CoreError, CoreResult};
use crate::index::{
    is_handle_shaped, Index, IndexDescriptor, IndexHandle, IndexKind, IndexRef, IndexRegistry,
    IndexStats, ParsedHandle,
};
use crate::predicate::Range;
use crate::types::CollectionId;
use crate::value::Value;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Identity, status, documents and indexes of one collection.
///
/// Reads and writes hold the status lock shared for their whole duration,
/// so a status change never interleaves with a write. Status changes and
/// index creation take it exclusively.
pub struct CollectionCore {
    id: CollectionId,
    name: String,
    status: RwLock<CollectionStatus>,
    registry: IndexRegistry,
    store: Arc<dyn DocumentStore>,
    config: Config,
}

impl CollectionCore {
    /// Creates a new-born collection over a store.
    ///
    /// Documents already in the store are indexed on first load.
    pub fn new(
        id: CollectionId,
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        config: Config,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            status: RwLock::new(CollectionStatus::NewBorn),
            registry: IndexRegistry::new(id),
            store,
            config,
        }
    }

    /// Returns the collection id.
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current status.
    pub fn status(&self) -> CollectionStatus {
        *self.status.read()
    }

    /// Returns the index registry.
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Returns index usage statistics.
    pub fn stats(&self) -> IndexStats {
        self.registry.stats()
    }

    // ---------------------------------------------------------------------
    // Status machine
    // ---------------------------------------------------------------------

    fn transition_error(&self, from: CollectionStatus, to: CollectionStatus) -> CoreError {
        CoreError::InvalidStatusTransition {
            name: self.name.clone(),
            from: from.name(),
            to: to.name(),
        }
    }

    fn check_loaded(&self, status: CollectionStatus) -> CoreResult<()> {
        if status == CollectionStatus::Loaded {
            Ok(())
        } else {
            Err(CoreError::CollectionNotLoaded {
                name: self.name.clone(),
                status: status.name().to_string(),
            })
        }
    }

    fn require_loaded(&self) -> CoreResult<RwLockReadGuard<'_, CollectionStatus>> {
        let status = self.status.read();
        self.check_loaded(*status)?;
        Ok(status)
    }

    /// Marks the collection corrupted if the result carries a store fault.
    ///
    /// Must be called with the status lock released.
    fn observe<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(CoreError::Storage { message }) = &result {
            let mut status = self.status.write();
            if *status != CollectionStatus::Deleted {
                error!(collection = %self.name, %message, "document store fault, collection corrupted");
                *status = CollectionStatus::Corrupted;
            }
        }
        result
    }

    /// Loads the collection.
    ///
    /// Loading an unloaded collection rebuilds every index from the store;
    /// loading an unloading one cancels the unload. Loading a loaded
    /// collection does nothing.
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` from `Corrupted` or `Deleted`.
    pub fn load(&self) -> CoreResult<()> {
        let result = self.load_locked();
        self.observe(result)
    }

    fn load_locked(&self) -> CoreResult<()> {
        let mut status = self.status.write();
        let from = *status;
        if from == CollectionStatus::Loaded {
            return Ok(());
        }
        if !from.can_become(CollectionStatus::Loaded) {
            return Err(self.transition_error(from, CollectionStatus::Loaded));
        }
        if matches!(from, CollectionStatus::NewBorn | CollectionStatus::Unloaded) {
            self.registry.rebuild(self.store.as_ref())?;
        }
        *status = CollectionStatus::Loaded;
        info!(collection = %self.name, id = %self.id, from = %from, "collection loaded");
        Ok(())
    }

    /// Starts unloading: `Loaded -> Unloading`.
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` from any other status.
    pub fn begin_unload(&self) -> CoreResult<()> {
        let mut status = self.status.write();
        if !status.can_become(CollectionStatus::Unloading) {
            return Err(self.transition_error(*status, CollectionStatus::Unloading));
        }
        *status = CollectionStatus::Unloading;
        debug!(collection = %self.name, "collection unloading");
        Ok(())
    }

    /// Completes unloading: `Unloading -> Unloaded`.
    ///
    /// Index entries are released; definitions are kept for the next load.
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` from any other status.
    pub fn complete_unload(&self) -> CoreResult<()> {
        let mut status = self.status.write();
        if !status.can_become(CollectionStatus::Unloaded) {
            return Err(self.transition_error(*status, CollectionStatus::Unloaded));
        }
        self.registry.clear_entries();
        *status = CollectionStatus::Unloaded;
        info!(collection = %self.name, id = %self.id, "collection unloaded");
        Ok(())
    }

    /// Unloads in one step. An unloaded collection stays as it is.
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` unless loaded, unloading or unloaded.
    pub fn unload(&self) -> CoreResult<()> {
        let mut status = self.status.write();
        match *status {
            CollectionStatus::Unloaded => return Ok(()),
            CollectionStatus::Loaded | CollectionStatus::Unloading => {}
            other => return Err(self.transition_error(other, CollectionStatus::Unloaded)),
        }
        self.registry.clear_entries();
        *status = CollectionStatus::Unloaded;
        info!(collection = %self.name, id = %self.id, "collection unloaded");
        Ok(())
    }

    /// Marks the collection corrupted.
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` for a deleted collection.
    pub fn mark_corrupted(&self) -> CoreResult<()> {
        let mut status = self.status.write();
        if !status.can_become(CollectionStatus::Corrupted) {
            return Err(self.transition_error(*status, CollectionStatus::Corrupted));
        }
        *status = CollectionStatus::Corrupted;
        error!(collection = %self.name, id = %self.id, "collection marked corrupted");
        Ok(())
    }

    /// Drops the collection: every document and index is released.
    ///
    /// Dropping a deleted collection does nothing.
    pub fn drop_collection(&self) -> CoreResult<()> {
        let mut status = self.status.write();
        if *status == CollectionStatus::Deleted {
            return Ok(());
        }
        self.registry.release();
        self.store.clear();
        *status = CollectionStatus::Deleted;
        info!(collection = %self.name, id = %self.id, "collection dropped");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    fn check_body(body: &Value) -> CoreResult<()> {
        if body.as_map().is_none() {
            return Err(CoreError::invalid_document(format!(
                "document body must be a map, got {}",
                body.type_name()
            )));
        }
        if body.get(Document::ID_FIELD).is_some() {
            return Err(CoreError::invalid_document(
                "_id is assigned by the collection",
            ));
        }
        Ok(())
    }

    /// Inserts a document and indexes it.
    ///
    /// `validate` runs after the status check.
    pub(crate) fn insert<F>(&self, body: Value, validate: F) -> CoreResult<DocumentId>
    where
        F: FnOnce(&Value) -> CoreResult<()>,
    {
        let result = self.insert_locked(body, validate);
        self.observe(result)
    }

    fn insert_locked<F>(&self, body: Value, validate: F) -> CoreResult<DocumentId>
    where
        F: FnOnce(&Value) -> CoreResult<()>,
    {
        let _status = self.require_loaded()?;
        Self::check_body(&body)?;
        validate(&body)?;

        let document = Document::new(DocumentId::new(), body);
        self.registry.index_document(&document)?;
        if let Err(err) = self.store.insert(document.clone()) {
            self.registry.unindex_document(&document);
            return Err(err);
        }
        Ok(document.id())
    }

    /// Replaces a document body. Returns `false` if the id is unknown.
    pub(crate) fn update<F>(&self, id: DocumentId, body: Value, validate: F) -> CoreResult<bool>
    where
        F: FnOnce(&Value) -> CoreResult<()>,
    {
        let result = self.update_locked(id, body, validate);
        self.observe(result)
    }

    fn update_locked<F>(&self, id: DocumentId, body: Value, validate: F) -> CoreResult<bool>
    where
        F: FnOnce(&Value) -> CoreResult<()>,
    {
        let _status = self.require_loaded()?;
        Self::check_body(&body)?;
        validate(&body)?;

        let Some(old) = self.store.get(id)? else {
            return Ok(false);
        };
        let new = Document::new(id, body);
        self.registry.reindex_document(&old, &new)?;

        match self.store.replace(new.clone()) {
            Ok(Some(_)) => Ok(true),
            Ok(None) => {
                self.registry.unindex_document(&new);
                Ok(false)
            }
            Err(err) => {
                if let Err(revert) = self.registry.reindex_document(&new, &old) {
                    warn!(collection = %self.name, document = %id, error = %revert, "failed to restore index entries");
                }
                Err(err)
            }
        }
    }

    /// Removes a document and its index entries.
    pub fn remove(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        let result = self.remove_locked(id);
        self.observe(result)
    }

    fn remove_locked(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        let _status = self.require_loaded()?;
        let removed = self.store.remove(id)?;
        if let Some(document) = &removed {
            self.registry.unindex_document(document);
        }
        Ok(removed)
    }

    /// Gets a document by id.
    pub fn get(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        let result = {
            let _status = self.require_loaded()?;
            self.store.get(id)
        };
        self.observe(result)
    }

    /// Returns the number of documents.
    pub fn count(&self) -> CoreResult<usize> {
        let _status = self.require_loaded()?;
        Ok(self.store.len())
    }

    /// Returns every document.
    pub fn to_vec(&self) -> CoreResult<Vec<Document>> {
        let result = self.to_vec_locked();
        self.observe(result)
    }

    fn to_vec_locked(&self) -> CoreResult<Vec<Document>> {
        let _status = self.require_loaded()?;
        let mut documents = Vec::with_capacity(self.store.len());
        for id in self.store.all_ids()? {
            if let Some(document) = self.store.get(id)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Removes every document, keeping the indexes.
    ///
    /// Returns the number of documents removed. The ids present at entry are
    /// removed one by one through the store; under
    /// [`TruncateMode::Strict`] a document count that moves in a way truncate
    /// did not cause fails the call.
    pub fn truncate(&self) -> CoreResult<usize> {
        let result = self.truncate_locked();
        self.observe(result)
    }

    fn truncate_locked(&self) -> CoreResult<usize> {
        let _status = self.require_loaded()?;
        let strict = self.config.truncate_mode == TruncateMode::Strict;

        let ids = self.store.all_ids()?;
        let mut expected = ids.len();
        let mut removed = 0;

        for id in ids {
            if strict {
                self.check_count(expected)?;
            }
            if let Some(document) = self.store.remove(id)? {
                self.registry.unindex_document(&document);
                removed += 1;
                expected -= 1;
            }
        }
        if strict {
            self.check_count(expected)?;
        }

        info!(collection = %self.name, removed, "collection truncated");
        Ok(removed)
    }

    fn check_count(&self, expected: usize) -> CoreResult<()> {
        let actual = self.store.len();
        if actual == expected {
            Ok(())
        } else {
            Err(CoreError::ConcurrentModification {
                name: self.name.clone(),
                expected,
                actual,
            })
        }
    }

    // ---------------------------------------------------------------------
    // Queries and indexes
    // ---------------------------------------------------------------------

    /// Runs a range query on one field.
    ///
    /// The registry picks the index; without a usable one every document is
    /// scanned and the plan is flagged `unindexed`.
    pub fn query(&self, field: &str, range: Range) -> CoreResult<QueryCursor> {
        let result = self.query_locked(field, range);
        self.observe(result)
    }

    fn query_locked(&self, field: &str, range: Range) -> CoreResult<QueryCursor> {
        let _status = self.require_loaded()?;
        let store = Arc::clone(&self.store);

        if let Some(index) = self.registry.select_for(field, &range) {
            let plan = QueryPlan {
                collection: self.id,
                field: field.to_string(),
                range: range.to_string(),
                index: Some(index.handle()),
                unindexed: false,
            };
            return Ok(QueryCursor::indexed(plan, store, index.lookup(range).into_iter()));
        }

        let ids = self.store.all_ids()?;
        if ids.len() > self.config.scan_warning_threshold {
            warn!(
                collection = %self.name,
                field,
                documents = ids.len(),
                threshold = self.config.scan_warning_threshold,
                "unindexed query scans every document"
            );
        }
        let plan = QueryPlan {
            collection: self.id,
            field: field.to_string(),
            range: range.to_string(),
            index: None,
            unindexed: true,
        };
        Ok(QueryCursor::full_scan(plan, store, ids, range))
    }

    /// Returns an index with this definition, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`IndexRegistry::create`].
    pub fn ensure_index(
        &self,
        kind: IndexKind,
        key_paths: Vec<String>,
        unique: bool,
    ) -> CoreResult<Arc<Index>> {
        let result = self.ensure_index_locked(kind, key_paths, unique);
        self.observe(result)
    }

    fn ensure_index_locked(
        &self,
        kind: IndexKind,
        key_paths: Vec<String>,
        unique: bool,
    ) -> CoreResult<Arc<Index>> {
        let status = self.status.write();
        self.check_loaded(*status)?;
        if let Some(existing) = self.registry.find_definition(kind, &key_paths, unique) {
            return Ok(existing);
        }
        self.registry.create(kind, key_paths, unique, self.store.as_ref())
    }

    /// Registers an index while the collection is being created.
    pub(crate) fn register_builtin(
        &self,
        kind: IndexKind,
        key_paths: Vec<String>,
    ) -> CoreResult<Arc<Index>> {
        self.registry.create(kind, key_paths, false, self.store.as_ref())
    }

    /// Resolves caller text to a handle of this collection.
    ///
    /// Text that is not handle-shaped is taken as a local id. Handles of
    /// other collections and malformed text resolve to nothing.
    fn resolve_handle(&self, reference: &IndexRef) -> Option<IndexHandle> {
        let text = reference.id();
        let parsed = if is_handle_shaped(text) {
            ParsedHandle::parse(text)
        } else {
            ParsedHandle::parse(&format!("{}/{}", self.id, text))
        };
        match parsed {
            Ok(parsed) if parsed.collection == self.id => parsed.handle(),
            _ => None,
        }
    }

    /// Finds an index by handle or local id.
    pub fn index(&self, reference: &IndexRef) -> CoreResult<Option<Arc<Index>>> {
        let _status = self.require_loaded()?;
        Ok(self
            .resolve_handle(reference)
            .and_then(|handle| self.registry.get(handle.local())))
    }

    /// Drops an index by handle or local id.
    ///
    /// Returns `false` if no such index exists.
    ///
    /// # Errors
    ///
    /// `IndexProtected` for the primary index, whatever the status;
    /// otherwise `CollectionNotLoaded` unless loaded.
    pub fn drop_index(&self, reference: &IndexRef) -> CoreResult<bool> {
        let handle = self.resolve_handle(reference);
        if let Some(handle) = handle.filter(|h| h.is_primary()) {
            return Err(CoreError::IndexProtected {
                id: handle.to_string(),
            });
        }
        let _status = self.require_loaded()?;
        match handle {
            Some(handle) => self.registry.remove(handle),
            None => Ok(false),
        }
    }

    /// Lists index descriptors ordered by local id.
    pub fn indexes(&self) -> CoreResult<Vec<IndexDescriptor>> {
        let _status = self.require_loaded()?;
        Ok(self.registry.descriptors())
    }
}

impl std::fmt::Debug for CollectionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocumentStore;
    use crate::error::ErrorKind;
    use crate::predicate::{eq, ge, range};
    use parking_lot::Mutex;

    fn core_with(config: Config) -> CollectionCore {
        CollectionCore::new(
            CollectionId::new(100),
            "users",
            Arc::new(MemoryDocumentStore::new()),
            config,
        )
    }

    fn loaded() -> CollectionCore {
        let core = core_with(Config::default());
        core.load().unwrap();
        core
    }

    fn person(age: i64) -> Value {
        Value::object([("age", age)])
    }

    fn no_check(_: &Value) -> CoreResult<()> {
        Ok(())
    }

    #[test]
    fn status_machine() {
        let core = core_with(Config::default());
        assert_eq!(core.status(), CollectionStatus::NewBorn);

        core.load().unwrap();
        core.load().unwrap();
        assert_eq!(core.status(), CollectionStatus::Loaded);

        core.begin_unload().unwrap();
        assert_eq!(core.status(), CollectionStatus::Unloading);
        core.load().unwrap();
        assert_eq!(core.status(), CollectionStatus::Loaded);

        core.begin_unload().unwrap();
        core.complete_unload().unwrap();
        assert_eq!(core.status(), CollectionStatus::Unloaded);
        assert_eq!(
            core.complete_unload().unwrap_err().kind(),
            ErrorKind::InvalidStatusTransition
        );

        core.mark_corrupted().unwrap();
        assert_eq!(
            core.load().unwrap_err().kind(),
            ErrorKind::InvalidStatusTransition
        );

        core.drop_collection().unwrap();
        core.drop_collection().unwrap();
        assert_eq!(core.status(), CollectionStatus::Deleted);
        assert_eq!(
            core.mark_corrupted().unwrap_err().kind(),
            ErrorKind::InvalidStatusTransition
        );
    }

    #[test]
    fn operations_require_loaded() {
        let core = core_with(Config::default());
        let err = core.insert(person(1), no_check).unwrap_err();
        assert_eq!(
            err,
            CoreError::CollectionNotLoaded {
                name: "users".into(),
                status: "new born".into()
            }
        );
        assert!(core.query("age", eq(1)).is_err());
        assert!(core.truncate().is_err());
        assert!(core.indexes().is_err());
        assert!(core
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .is_err());
    }

    #[test]
    fn reload_rebuilds_indexes() {
        let core = loaded();
        let index = core
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();
        let id = core.insert(person(5), no_check).unwrap();

        core.unload().unwrap();
        assert!(index.is_empty());
        assert_eq!(core.registry().len(), 2);

        core.load().unwrap();
        assert_eq!(index.lookup(eq(5)).to_vec().unwrap(), vec![id]);
    }

    #[test]
    fn body_must_be_a_map_without_id() {
        let core = loaded();
        assert_eq!(
            core.insert(Value::Integer(1), no_check).unwrap_err().kind(),
            ErrorKind::InvalidDocument
        );
        let with_id = Value::object([("_id", "x")]);
        assert_eq!(
            core.insert(with_id, no_check).unwrap_err().kind(),
            ErrorKind::InvalidDocument
        );
    }

    #[test]
    fn unique_violation_leaves_store_untouched() {
        let core = loaded();
        core.ensure_index(IndexKind::Hash, vec!["age".into()], true)
            .unwrap();
        core.insert(person(1), no_check).unwrap();

        let err = core.insert(person(1), no_check).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(core.count().unwrap(), 1);
    }

    #[test]
    fn update_moves_index_entries() {
        let core = loaded();
        let index = core
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();
        let id = core.insert(person(1), no_check).unwrap();

        assert!(core.update(id, person(9), no_check).unwrap());
        assert!(index.lookup(eq(1)).to_vec().unwrap().is_empty());
        assert_eq!(index.lookup(eq(9)).to_vec().unwrap(), vec![id]);

        assert!(!core.update(DocumentId::new(), person(2), no_check).unwrap());
    }

    #[test]
    fn ensure_index_returns_existing_definition() {
        let core = loaded();
        let first = core
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();
        let second = core
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();
        assert_eq!(first.handle(), second.handle());
    }

    #[test]
    fn query_plans() {
        let core = loaded();
        for age in [3, 7, 11] {
            core.insert(person(age), no_check).unwrap();
        }

        let cursor = core.query("age", range(5, 20)).unwrap();
        assert!(cursor.plan().unindexed);
        assert_eq!(cursor.to_vec().unwrap().len(), 2);

        core.ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();
        let cursor = core.query("age", range(5, 20)).unwrap();
        assert_eq!(cursor.plan().index.map(|h| h.to_string()), Some("100/1".into()));
        let ages: Vec<_> = cursor
            .map(|d| d.unwrap().body().get("age").cloned().unwrap())
            .collect();
        assert_eq!(ages, vec![Value::Integer(7), Value::Integer(11)]);

        let stats = core.stats();
        assert_eq!((stats.lookups, stats.full_scans), (1, 1));
    }

    #[test]
    fn unindexed_query_reports_mismatch() {
        let core = loaded();
        core.insert(Value::object([("age", "old")]), no_check).unwrap();
        let items: Vec<_> = core.query("age", ge(1)).unwrap().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn lenient_index_references() {
        let core = loaded();
        core.ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();

        assert!(core.index(&"1".into()).unwrap().is_some());
        assert!(core.index(&"100/1".into()).unwrap().is_some());
        assert!(core.index(&"0".into()).unwrap().unwrap().is_primary());
        assert!(core.index(&"7/1".into()).unwrap().is_none());
        assert!(core.index(&"x".into()).unwrap().is_none());
        assert!(core.index(&"100/1x".into()).unwrap().is_none());
    }

    #[test]
    fn primary_protected_in_every_status() {
        let core = core_with(Config::default());
        for step in 0..4 {
            match step {
                1 => core.load().unwrap(),
                2 => core.unload().unwrap(),
                3 => core.drop_collection().unwrap(),
                _ => {}
            }
            for reference in ["0", "100/0"] {
                assert_eq!(
                    core.drop_index(&reference.into()).unwrap_err().kind(),
                    ErrorKind::IndexProtected
                );
            }
        }
    }

    #[test]
    fn truncate_keeps_indexes() {
        let core = loaded();
        let index = core
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();
        for age in 0..10 {
            core.insert(person(age), no_check).unwrap();
        }

        assert_eq!(core.truncate().unwrap(), 10);
        assert_eq!(core.count().unwrap(), 0);
        assert!(index.is_empty());
        assert!(core.registry().primary().unwrap().is_empty());
        assert_eq!(core.indexes().unwrap().len(), 2);
    }

    /// Store whose first removal also inserts a stranger.
    #[derive(Default)]
    struct IntrudingStore {
        inner: MemoryDocumentStore,
        intruded: Mutex<bool>,
    }

    impl DocumentStore for IntrudingStore {
        fn get(&self, id: DocumentId) -> CoreResult<Option<Document>> {
            self.inner.get(id)
        }
        fn insert(&self, document: Document) -> CoreResult<()> {
            self.inner.insert(document)
        }
        fn replace(&self, document: Document) -> CoreResult<Option<Document>> {
            self.inner.replace(document)
        }
        fn remove(&self, id: DocumentId) -> CoreResult<Option<Document>> {
            let removed = self.inner.remove(id)?;
            let mut intruded = self.intruded.lock();
            if !*intruded {
                *intruded = true;
                self.inner
                    .insert(Document::new(DocumentId::new(), person(99)))?;
            }
            Ok(removed)
        }
        fn all_ids(&self) -> CoreResult<Vec<DocumentId>> {
            self.inner.all_ids()
        }
        fn len(&self) -> usize {
            self.inner.len()
        }
        fn clear(&self) {
            self.inner.clear();
        }
    }

    fn intruded(mode: TruncateMode) -> CollectionCore {
        let core = CollectionCore::new(
            CollectionId::new(5),
            "racy",
            Arc::new(IntrudingStore::default()),
            Config::new().truncate_mode(mode),
        );
        core.load().unwrap();
        for age in 0..3 {
            core.insert(person(age), no_check).unwrap();
        }
        core
    }

    #[test]
    fn snapshot_truncate_spares_late_documents() {
        let core = intruded(TruncateMode::Snapshot);
        assert_eq!(core.truncate().unwrap(), 3);
        assert_eq!(core.count().unwrap(), 1);
    }

    #[test]
    fn strict_truncate_detects_interference() {
        let core = intruded(TruncateMode::Strict);
        let err = core.truncate().unwrap_err();
        assert_eq!(
            err,
            CoreError::ConcurrentModification {
                name: "racy".into(),
                expected: 2,
                actual: 3
            }
        );
    }

    /// Store that fails every listing.
    #[derive(Default)]
    struct FaultyStore(MemoryDocumentStore);

    impl DocumentStore for FaultyStore {
        fn get(&self, id: DocumentId) -> CoreResult<Option<Document>> {
            self.0.get(id)
        }
        fn insert(&self, document: Document) -> CoreResult<()> {
            self.0.insert(document)
        }
        fn replace(&self, document: Document) -> CoreResult<Option<Document>> {
            self.0.replace(document)
        }
        fn remove(&self, id: DocumentId) -> CoreResult<Option<Document>> {
            self.0.remove(id)
        }
        fn all_ids(&self) -> CoreResult<Vec<DocumentId>> {
            Err(CoreError::storage("listing failed"))
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn clear(&self) {
            self.0.clear();
        }
    }

    #[test]
    fn storage_fault_corrupts_collection() {
        let core = CollectionCore::new(
            CollectionId::new(9),
            "faulty",
            Arc::new(FaultyStore::default()),
            Config::default(),
        );
        assert_eq!(core.load().unwrap_err().kind(), ErrorKind::Storage);
        assert_eq!(core.status(), CollectionStatus::Corrupted);
    }
}
