//! Index traits and key types.

use crate::document::{Document, DocumentId};
use crate::error::CoreResult;
use crate::index::definition::IndexSpec;
use crate::index::ordered::OrderedIndex;
use crate::value::Value;
use std::fmt;

static NULL: Value = Value::Null;

/// A key stored in an index: one value per key path.
///
/// Keys order lexicographically by their parts under the storage order of
/// [`Value`], so a one-part key sorts before every longer key sharing its
/// first part. Predicates are evaluated against the leading part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexKey(Vec<Value>);

impl IndexKey {
    /// Creates a key from its parts.
    pub fn new(parts: Vec<Value>) -> Self {
        Self(parts)
    }

    /// Creates a single-part key.
    pub fn single(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    /// Extracts a key from a document.
    ///
    /// Returns `None` if the document lacks any of the key paths.
    pub fn extract(document: &Document, key_paths: &[String]) -> Option<Self> {
        key_paths
            .iter()
            .map(|path| document.field(path).map(|v| v.into_owned()))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Returns the key parts.
    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    /// Returns the first part, the one predicates compare against.
    pub fn leading(&self) -> &Value {
        self.0.first().unwrap_or(&NULL)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            parts => write!(f, "{}", Value::Array(parts.to_vec())),
        }
    }
}

/// Storage structure behind an index.
///
/// All index implementations must provide these operations. Locking is
/// the caller's concern; structures are plain data.
pub trait IndexStructure: Send + Sync {
    /// Returns the index specification.
    fn spec(&self) -> &IndexSpec;

    /// Inserts a key-document mapping.
    ///
    /// Re-inserting an existing pair is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the index is unique and the key already
    /// maps to another document.
    fn insert(&mut self, key: IndexKey, document: DocumentId) -> CoreResult<()>;

    /// Removes a key-document mapping, returning whether it existed.
    fn remove(&mut self, key: &IndexKey, document: DocumentId) -> bool;

    /// Looks up documents by exact key.
    fn lookup(&self, key: &IndexKey) -> Vec<DocumentId>;

    /// Checks if the index contains a key.
    fn contains(&self, key: &IndexKey) -> bool;

    /// Returns every key-document pair.
    fn entries(&self) -> Vec<(IndexKey, DocumentId)>;

    /// Returns the number of key-document pairs in the index.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the index.
    fn clear(&mut self);

    /// Returns the ordered view of this structure, if it keeps keys sorted.
    fn as_ordered(&self) -> Option<&OrderedIndex> {
        None
    }
}
