//! Documents and the document store boundary.

mod id;
mod store;

pub use id::DocumentId;
pub use store::{DocumentStore, MemoryDocumentStore};

use crate::value::Value;
use std::borrow::Cow;

/// A stored document: its identity plus a map body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    body: Value,
}

impl Document {
    /// Reserved field exposing the document id to predicates and indexes.
    pub const ID_FIELD: &'static str = "_id";

    /// Creates a document.
    pub fn new(id: DocumentId, body: Value) -> Self {
        Self { id, body }
    }

    /// Returns the document id.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the document body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the document, returning its body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Extracts the value at a dotted field path.
    ///
    /// `_id` resolves to the document id as text.
    pub fn field(&self, path: &str) -> Option<Cow<'_, Value>> {
        if path == Self::ID_FIELD {
            return Some(Cow::Owned(self.id.to_value()));
        }
        self.body.get_path(path).map(Cow::Borrowed)
    }
}
