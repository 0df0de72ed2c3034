//! Document store boundary and its in-memory implementation.

use crate::document::{Document, DocumentId};
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Storage for the documents of one collection.
///
/// The store knows nothing about indexes; the owning collection keeps
/// indexes in step with every call it makes here. Implementations report
/// unrecoverable faults as [`CoreError::Storage`].
pub trait DocumentStore: Send + Sync {
    /// Gets a document by id.
    fn get(&self, id: DocumentId) -> CoreResult<Option<Document>>;

    /// Inserts a new document. Fails if the id is already present.
    fn insert(&self, document: Document) -> CoreResult<()>;

    /// Replaces an existing document, returning the previous version.
    ///
    /// Returns `None` and stores nothing if the id is absent.
    fn replace(&self, document: Document) -> CoreResult<Option<Document>>;

    /// Removes a document, returning it if it was present.
    fn remove(&self, id: DocumentId) -> CoreResult<Option<Document>>;

    /// Returns the ids of all documents.
    fn all_ids(&self) -> CoreResult<Vec<DocumentId>>;

    /// Returns the number of documents.
    fn len(&self) -> usize;

    /// Returns true if the store holds no documents.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every document without per-document bookkeeping.
    fn clear(&self);
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentId, Document>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        Ok(self.documents.read().get(&id).cloned())
    }

    fn insert(&self, document: Document) -> CoreResult<()> {
        let mut documents = self.documents.write();
        if documents.contains_key(&document.id()) {
            return Err(CoreError::invalid_operation(format!(
                "document {} already exists",
                document.id()
            )));
        }
        documents.insert(document.id(), document);
        Ok(())
    }

    fn replace(&self, document: Document) -> CoreResult<Option<Document>> {
        let mut documents = self.documents.write();
        match documents.get_mut(&document.id()) {
            Some(slot) => Ok(Some(std::mem::replace(slot, document))),
            None => Ok(None),
        }
    }

    fn remove(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        Ok(self.documents.write().remove(&id))
    }

    fn all_ids(&self) -> CoreResult<Vec<DocumentId>> {
        Ok(self.documents.read().keys().copied().collect())
    }

    fn len(&self) -> usize {
        self.documents.read().len()
    }

    fn clear(&self) {
        self.documents.write().clear();
    }
}
