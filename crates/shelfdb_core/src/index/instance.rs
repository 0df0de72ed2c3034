//! A registered index: specification plus its locked structure.

use crate::document::{Document, DocumentId};
use crate::error::{CoreError, CoreResult};
use crate::index::definition::{IndexDescriptor, IndexKind, IndexSpec};
use crate::index::handle::IndexHandle;
use crate::index::hash::HashIndex;
use crate::index::ordered::OrderedIndex;
use crate::index::scan::Lookup;
use crate::index::traits::{IndexKey, IndexStructure};
use crate::predicate::Range;
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::Arc;

/// One index of a collection.
///
/// Each index carries its own lock: lookups share it, inserts and removes
/// take it exclusively. Nothing here touches the registry or other indexes.
pub struct Index {
    spec: IndexSpec,
    structure: RwLock<Box<dyn IndexStructure>>,
}

impl Index {
    /// Creates an empty index for a specification.
    pub(crate) fn new(spec: IndexSpec) -> Self {
        let structure = Self::structure_for(&spec);
        Self {
            spec,
            structure: RwLock::new(structure),
        }
    }

    fn structure_for(spec: &IndexSpec) -> Box<dyn IndexStructure> {
        match spec.kind {
            IndexKind::Ordered => Box::new(OrderedIndex::new(spec.clone())),
            IndexKind::Hash | IndexKind::Primary => Box::new(HashIndex::new(spec.clone())),
        }
    }

    /// Returns the index specification.
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Returns the index handle.
    pub fn handle(&self) -> IndexHandle {
        self.spec.handle
    }

    /// Returns the index type.
    pub fn kind(&self) -> IndexKind {
        self.spec.kind
    }

    /// Returns the key paths.
    pub fn key_paths(&self) -> &[String] {
        &self.spec.key_paths
    }

    /// Returns whether the index enforces uniqueness.
    pub fn is_unique(&self) -> bool {
        self.spec.unique
    }

    /// Returns true for the primary index.
    pub fn is_primary(&self) -> bool {
        self.spec.kind == IndexKind::Primary
    }

    /// Adds a key-document association.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the index is unique and the key belongs to
    /// another document.
    pub fn insert(&self, key: IndexKey, document: DocumentId) -> CoreResult<()> {
        self.structure.write().insert(key, document)
    }

    /// Removes a key-document association. Absent pairs are a no-op.
    pub fn remove(&self, key: &IndexKey, document: DocumentId) -> bool {
        self.structure.write().remove(key, document)
    }

    /// Checks if the index contains a key.
    pub fn contains(&self, key: &IndexKey) -> bool {
        self.structure.read().contains(key)
    }

    /// Returns the number of key-document pairs.
    pub fn len(&self) -> usize {
        self.structure.read().len()
    }

    /// Returns true if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if [`Index::lookup`] can serve the range efficiently.
    ///
    /// Ordered indexes serve any range; hash and primary indexes only a
    /// single `==` on a single key path.
    pub fn supports(&self, range: &Range) -> bool {
        match self.spec.kind {
            IndexKind::Ordered => true,
            IndexKind::Hash | IndexKind::Primary => {
                range.is_point() && self.spec.key_paths.len() == 1
            }
        }
    }

    /// Returns a lazy, restartable lookup of the documents whose key
    /// satisfies the range.
    pub fn lookup(self: &Arc<Self>, range: Range) -> Lookup {
        Lookup::new(Arc::clone(self), range)
    }

    /// Discards all entries of this index.
    ///
    /// # Errors
    ///
    /// `IndexProtected` for the primary index.
    pub fn drop_index(&self) -> CoreResult<()> {
        if self.is_primary() {
            return Err(CoreError::IndexProtected {
                id: self.spec.handle.to_string(),
            });
        }
        self.clear();
        Ok(())
    }

    /// Returns a serializable summary.
    pub fn descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            id: self.spec.handle.to_string(),
            kind: self.spec.kind,
            fields: self.spec.key_paths.clone(),
            unique: self.spec.unique,
            size: self.len(),
        }
    }

    /// Extracts this index's key from a document.
    pub(crate) fn key_for(&self, document: &Document) -> Option<IndexKey> {
        IndexKey::extract(document, &self.spec.key_paths)
    }

    /// Clears all entries, keeping the definition.
    pub(crate) fn clear(&self) {
        self.structure.write().clear();
    }

    /// Replaces the entries with those of the given documents.
    ///
    /// The new structure is built aside and swapped in only on success.
    pub(crate) fn rebuild<I>(&self, documents: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut fresh = Self::structure_for(&self.spec);
        for document in documents {
            if let Some(key) = self.key_for(&document) {
                fresh.insert(key, document.id())?;
            }
        }
        *self.structure.write() = fresh;
        Ok(())
    }

    /// Acquires the shared lock for a scan step.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Box<dyn IndexStructure>> {
        self.structure.read()
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("handle", &self.spec.handle.to_string())
            .field("kind", &self.spec.kind)
            .field("key_paths", &self.spec.key_paths)
            .field("unique", &self.spec.unique)
            .finish_non_exhaustive()
    }
}
