//! Collections: documents, their indexes and their lifecycle.
//!
//! Both collection kinds share one [`Collection`] trait whose provided
//! methods run on a [`CollectionCore`]. A kind only contributes its name
//! and its document validation.

mod core;
mod document;
mod edge;
mod query;
mod status;

pub use self::core::CollectionCore;
pub use document::DocumentCollection;
pub use edge::{EdgeCollection, FROM_FIELD, TO_FIELD};
pub use query::{QueryCursor, QueryPlan};
pub use status::CollectionStatus;

use crate::document::{Document, DocumentId};
use crate::error::{CoreError, CoreResult};
use crate::index::{Index, IndexDescriptor, IndexKind, IndexRef, IndexStats};
use crate::predicate::Range;
use crate::types::CollectionId;
use crate::value::Value;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Kind of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Plain documents.
    #[default]
    Document,
    /// Edges between documents, carrying `_from` and `_to`.
    Edge,
}

impl CollectionKind {
    /// Returns the type name used in collection display strings.
    pub fn type_name(self) -> &'static str {
        match self {
            CollectionKind::Document => "DocumentCollection",
            CollectionKind::Edge => "EdgeCollection",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Document => f.write_str("document"),
            CollectionKind::Edge => f.write_str("edge"),
        }
    }
}

impl FromStr for CollectionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(CollectionKind::Document),
            "edge" => Ok(CollectionKind::Edge),
            other => Err(CoreError::invalid_operation(format!(
                "unknown collection kind: {other}"
            ))),
        }
    }
}

/// Writes `[<Kind> <id>, "<name>" (status <status>)]`.
pub(crate) fn describe(
    f: &mut fmt::Formatter<'_>,
    kind: CollectionKind,
    core: &CollectionCore,
) -> fmt::Result {
    write!(
        f,
        "[{} {}, {:?} (status {})]",
        kind.type_name(),
        core.id(),
        core.name(),
        core.status()
    )
}

/// A collection of documents.
///
/// Every operation except the status transitions and dropping the primary
/// index requires the collection to be loaded and fails with
/// `CollectionNotLoaded` otherwise.
pub trait Collection: fmt::Display + fmt::Debug + Send + Sync {
    /// Returns the shared collection state.
    fn core(&self) -> &CollectionCore;

    /// Returns the collection kind.
    fn kind(&self) -> CollectionKind;

    /// Checks a document body before it is stored.
    fn validate(&self, body: &Value) -> CoreResult<()> {
        let _ = body;
        Ok(())
    }

    /// Returns the collection id.
    fn id(&self) -> CollectionId {
        self.core().id()
    }

    /// Returns the collection name.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Returns the current status.
    fn status(&self) -> CollectionStatus {
        self.core().status()
    }

    /// Inserts a document, returning its new id.
    fn insert(&self, body: Value) -> CoreResult<DocumentId> {
        self.core().insert(body, |body| self.validate(body))
    }

    /// Replaces a document body. Returns `false` if the id is unknown.
    fn update(&self, id: DocumentId, body: Value) -> CoreResult<bool> {
        self.core().update(id, body, |body| self.validate(body))
    }

    /// Removes a document.
    fn remove(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        self.core().remove(id)
    }

    /// Gets a document by id.
    fn get(&self, id: DocumentId) -> CoreResult<Option<Document>> {
        self.core().get(id)
    }

    /// Returns the number of documents.
    fn count(&self) -> CoreResult<usize> {
        self.core().count()
    }

    /// Returns every document.
    fn to_vec(&self) -> CoreResult<Vec<Document>> {
        self.core().to_vec()
    }

    /// Removes every document, keeping the indexes.
    fn truncate(&self) -> CoreResult<usize> {
        self.core().truncate()
    }

    /// Runs a range query on one field.
    fn query(&self, field: &str, range: Range) -> CoreResult<QueryCursor> {
        self.core().query(field, range)
    }

    /// Returns an index with this definition, creating it if needed.
    fn ensure_index(
        &self,
        kind: IndexKind,
        key_paths: Vec<String>,
        unique: bool,
    ) -> CoreResult<Arc<Index>> {
        self.core().ensure_index(kind, key_paths, unique)
    }

    /// Finds an index by handle (`"100/1"`) or local id (`"1"`).
    fn index(&self, reference: &IndexRef) -> CoreResult<Option<Arc<Index>>> {
        self.core().index(reference)
    }

    /// Drops an index. Returns `false` if no such index exists.
    fn drop_index(&self, reference: &IndexRef) -> CoreResult<bool> {
        self.core().drop_index(reference)
    }

    /// Lists the indexes ordered by local id.
    fn indexes(&self) -> CoreResult<Vec<IndexDescriptor>> {
        self.core().indexes()
    }

    /// Returns index usage statistics.
    fn stats(&self) -> IndexStats {
        self.core().stats()
    }

    /// Loads the collection.
    fn load(&self) -> CoreResult<()> {
        self.core().load()
    }

    /// Unloads the collection in one step.
    fn unload(&self) -> CoreResult<()> {
        self.core().unload()
    }

    /// Starts unloading.
    fn begin_unload(&self) -> CoreResult<()> {
        self.core().begin_unload()
    }

    /// Completes a started unload.
    fn complete_unload(&self) -> CoreResult<()> {
        self.core().complete_unload()
    }

    /// Marks the collection corrupted.
    fn mark_corrupted(&self) -> CoreResult<()> {
        self.core().mark_corrupted()
    }

    /// Drops the collection with all its documents and indexes.
    fn drop_collection(&self) -> CoreResult<()> {
        self.core().drop_collection()
    }
}
