//! Database facade: the collection catalog.

use crate::collection::{Collection, CollectionKind, DocumentCollection, EdgeCollection};
use crate::config::Config;
use crate::document::{DocumentStore, MemoryDocumentStore};
use crate::error::{CoreError, CoreResult};
use crate::index::{Index, IndexRef, ParsedHandle};
use crate::types::CollectionId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Parameters of a new collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    /// Collection name. Unique within the database.
    pub name: String,
    /// Explicit id; assigned by the database when `None`.
    pub id: Option<CollectionId>,
    /// Collection kind.
    pub kind: CollectionKind,
}

impl CollectionSpec {
    /// Creates a spec for a document collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            kind: CollectionKind::Document,
        }
    }

    /// Sets an explicit id.
    #[must_use]
    pub fn id(mut self, id: u64) -> Self {
        self.id = Some(CollectionId::new(id));
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn kind(mut self, kind: CollectionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// How a caller names a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionTarget {
    /// By name. Digit strings are tried as ids first.
    Name(String),
    /// By id.
    Id(CollectionId),
}

impl From<&str> for CollectionTarget {
    fn from(name: &str) -> Self {
        CollectionTarget::Name(name.to_string())
    }
}

impl From<String> for CollectionTarget {
    fn from(name: String) -> Self {
        CollectionTarget::Name(name)
    }
}

impl From<CollectionId> for CollectionTarget {
    fn from(id: CollectionId) -> Self {
        CollectionTarget::Id(id)
    }
}

/// The main database handle.
///
/// Holds the catalog of collections and resolves collection names, ids and
/// index handles. Collections are kept in memory; each one owns its
/// document store.
///
/// ```rust
/// use shelfdb_core::{predicate::range, Collection, CollectionSpec, Database, IndexKind, Value};
///
/// let db = Database::new();
/// let users = db.create(CollectionSpec::new("users").id(100))?;
/// users.ensure_index(IndexKind::Ordered, vec!["age".into()], false)?;
/// users.insert(Value::object([("age", 12)]))?;
///
/// let teens = users.query("age", range(10, 20))?.to_vec()?;
/// assert_eq!(teens.len(), 1);
/// assert!(db.index("100/1")?.is_some());
/// # Ok::<(), shelfdb_core::CoreError>(())
/// ```
pub struct Database {
    /// Configuration handed to every collection.
    config: Config,
    /// Collections keyed by id.
    collections: RwLock<BTreeMap<CollectionId, Arc<dyn Collection>>>,
    /// Next id to try for collections created without one.
    next_collection_id: AtomicU64,
}

impl Database {
    /// Creates an empty database with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty database.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let first = config.first_collection_id;
        Self {
            config,
            collections: RwLock::new(BTreeMap::new()),
            next_collection_id: AtomicU64::new(first),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates and loads an in-memory collection.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the name or the explicit id is taken.
    pub fn create(&self, spec: CollectionSpec) -> CoreResult<Arc<dyn Collection>> {
        self.create_with_store(spec, Arc::new(MemoryDocumentStore::new()))
    }

    /// Creates and loads a collection over a given store.
    ///
    /// Documents already in the store are indexed during the load.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the name or the explicit id is taken; store
    /// faults while loading.
    pub fn create_with_store(
        &self,
        spec: CollectionSpec,
        store: Arc<dyn DocumentStore>,
    ) -> CoreResult<Arc<dyn Collection>> {
        if spec.name.is_empty() {
            return Err(CoreError::invalid_operation("collection name is empty"));
        }

        let mut collections = self.collections.write();
        if collections.values().any(|c| c.name() == spec.name) {
            return Err(CoreError::invalid_operation(format!(
                "collection {:?} already exists",
                spec.name
            )));
        }

        let id = match spec.id {
            Some(id) if collections.contains_key(&id) => {
                return Err(CoreError::invalid_operation(format!(
                    "collection id {id} is already in use"
                )));
            }
            Some(id) => {
                self.next_collection_id
                    .fetch_max(id.as_u64().saturating_add(1), Ordering::SeqCst);
                id
            }
            None => loop {
                let candidate =
                    CollectionId::new(self.next_collection_id.fetch_add(1, Ordering::SeqCst));
                if !collections.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        let config = self.config.clone();
        let collection: Arc<dyn Collection> = match spec.kind {
            CollectionKind::Document => {
                Arc::new(DocumentCollection::new(id, spec.name, store, config))
            }
            CollectionKind::Edge => Arc::new(EdgeCollection::new(id, spec.name, store, config)?),
        };
        collection.load()?;

        info!(collection = %collection.name(), id = %id, kind = %spec.kind, "created collection");
        collections.insert(id, Arc::clone(&collection));
        Ok(collection)
    }

    fn resolve(
        collections: &BTreeMap<CollectionId, Arc<dyn Collection>>,
        target: &CollectionTarget,
    ) -> Option<Arc<dyn Collection>> {
        match target {
            CollectionTarget::Id(id) => collections.get(id).cloned(),
            CollectionTarget::Name(name) => {
                let by_id = name
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| collections.get(&CollectionId::new(id)));
                by_id
                    .or_else(|| collections.values().find(|c| c.name() == name.as_str()))
                    .cloned()
            }
        }
    }

    /// Looks up a collection by name or id.
    pub fn collection(&self, target: impl Into<CollectionTarget>) -> Option<Arc<dyn Collection>> {
        Self::resolve(&self.collections.read(), &target.into())
    }

    /// Returns every collection ordered by id.
    pub fn collections(&self) -> Vec<Arc<dyn Collection>> {
        self.collections.read().values().cloned().collect()
    }

    /// Drops a collection and removes it from the catalog.
    ///
    /// Returns `false` if the target does not resolve.
    pub fn drop_collection(&self, target: impl Into<CollectionTarget>) -> CoreResult<bool> {
        let target = target.into();
        let mut collections = self.collections.write();
        let Some(collection) = Self::resolve(&collections, &target) else {
            return Ok(false);
        };
        collection.drop_collection()?;
        collections.remove(&collection.id());
        info!(collection = %collection.name(), id = %collection.id(), "dropped collection");
        Ok(true)
    }

    /// Truncates a collection.
    ///
    /// Returns the number of documents removed, or `None` if the target does
    /// not resolve.
    pub fn truncate(&self, target: impl Into<CollectionTarget>) -> CoreResult<Option<usize>> {
        match self.collection(target) {
            Some(collection) => collection.truncate().map(Some),
            None => Ok(None),
        }
    }

    fn collection_for(&self, reference: &IndexRef) -> CoreResult<Arc<dyn Collection>> {
        let parsed = ParsedHandle::parse(reference.id())?;
        self.collection(parsed.collection)
            .ok_or_else(|| CoreError::collection_not_found(parsed.collection.to_string()))
    }

    /// Finds an index by its full handle.
    ///
    /// # Errors
    ///
    /// `MalformedIndexHandle` unless the text starts with
    /// `<digits>/<digits>`; `CollectionNotFound` if the collection part does
    /// not resolve.
    pub fn index(&self, reference: impl Into<IndexRef>) -> CoreResult<Option<Arc<Index>>> {
        let reference = reference.into();
        self.collection_for(&reference)?.index(&reference)
    }

    /// Drops an index by its full handle.
    ///
    /// Returns `false` if the collection has no such index.
    ///
    /// # Errors
    ///
    /// As [`Database::index`], plus `IndexProtected` for a primary index.
    pub fn drop_index(&self, reference: impl Into<IndexRef>) -> CoreResult<bool> {
        let reference = reference.into();
        self.collection_for(&reference)?.drop_index(&reference)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("collections", &self.collections.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionStatus;
    use crate::error::ErrorKind;
    use crate::index::IndexKind;
    use crate::value::Value;

    #[test]
    fn create_assigns_ids_and_loads() {
        let db = Database::with_config(Config::new().first_collection_id(10));
        let a = db.create(CollectionSpec::new("a")).unwrap();
        let b = db.create(CollectionSpec::new("b").id(11)).unwrap();
        let c = db.create(CollectionSpec::new("c")).unwrap();

        assert_eq!(a.id(), CollectionId::new(10));
        assert_eq!(b.id(), CollectionId::new(11));
        assert_eq!(c.id(), CollectionId::new(12));
        assert_eq!(a.status(), CollectionStatus::Loaded);
    }

    #[test]
    fn create_rejects_duplicates() {
        let db = Database::new();
        db.create(CollectionSpec::new("users").id(5)).unwrap();

        let err = db.create(CollectionSpec::new("users")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        let err = db.create(CollectionSpec::new("other").id(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn resolution_prefers_ids() {
        let db = Database::new();
        db.create(CollectionSpec::new("7").id(1)).unwrap();
        db.create(CollectionSpec::new("users").id(7)).unwrap();

        assert_eq!(db.collection("7").unwrap().name(), "users");
        assert_eq!(db.collection("1").unwrap().name(), "7");
        assert_eq!(db.collection("users").unwrap().id(), CollectionId::new(7));
        assert!(db.collection("nobody").is_none());
        assert!(db.collection(CollectionId::new(99)).is_none());
    }

    #[test]
    fn drop_and_truncate_ignore_unknown_targets() {
        let db = Database::new();
        assert!(!db.drop_collection("ghost").unwrap());
        assert_eq!(db.truncate("ghost").unwrap(), None);

        let users = db.create(CollectionSpec::new("users")).unwrap();
        users.insert(Value::object([("age", 1)])).unwrap();
        assert_eq!(db.truncate("users").unwrap(), Some(1));

        assert!(db.drop_collection("users").unwrap());
        assert_eq!(users.status(), CollectionStatus::Deleted);
        assert!(db.collection("users").is_none());
        assert!(db.collections().is_empty());
    }

    #[test]
    fn index_handles_are_strict() {
        let db = Database::new();
        let users = db.create(CollectionSpec::new("users").id(100)).unwrap();
        users
            .ensure_index(IndexKind::Ordered, vec!["age".into()], false)
            .unwrap();

        assert!(db.index("100/1").unwrap().is_some());
        assert!(db.index("100/2").unwrap().is_none());
        assert!(db.index("100/1x").unwrap().is_none());
        assert_eq!(
            db.index("1").unwrap_err().kind(),
            ErrorKind::MalformedIndexHandle
        );
        assert_eq!(
            db.index("42/1").unwrap_err().kind(),
            ErrorKind::CollectionNotFound
        );
        assert_eq!(
            db.drop_index("100/0").unwrap_err().kind(),
            ErrorKind::IndexProtected
        );
        assert!(db.drop_index("100/1").unwrap());
        assert!(!db.drop_index("100/1").unwrap());
    }

    #[test]
    fn edge_collections() {
        let db = Database::new();
        let knows = db
            .create(CollectionSpec::new("knows").kind(CollectionKind::Edge))
            .unwrap();
        assert_eq!(knows.kind(), CollectionKind::Edge);
        assert_eq!(knows.indexes().unwrap().len(), 3);
        assert!(knows.insert(Value::object([("age", 1)])).is_err());
    }
}
