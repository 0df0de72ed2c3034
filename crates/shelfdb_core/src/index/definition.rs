//! Index kinds, specifications and descriptors.

use crate::error::CoreError;
use crate::index::handle::IndexHandle;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Type of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Mandatory unique index on `_id`.
    Primary,
    /// Sorted structure supporting range scans.
    Ordered,
    /// Hash structure for equality lookups.
    Hash,
}

impl IndexKind {
    /// Returns true if keys are kept in ascending order.
    pub fn is_ordered(self) -> bool {
        matches!(self, IndexKind::Ordered)
    }

    /// Returns the lowercase kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Ordered => "ordered",
            IndexKind::Hash => "hash",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(IndexKind::Primary),
            "ordered" | "skiplist" => Ok(IndexKind::Ordered),
            "hash" => Ok(IndexKind::Hash),
            other => Err(CoreError::invalid_operation(format!(
                "unknown index type: {other}"
            ))),
        }
    }
}

/// Specification of one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Handle `<collection-id>/<local-id>`.
    pub handle: IndexHandle,
    /// Index type.
    pub kind: IndexKind,
    /// Dotted field paths making up the key, in order. Never empty.
    pub key_paths: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a new index specification.
    pub fn new(handle: IndexHandle, kind: IndexKind, key_paths: Vec<String>) -> Self {
        Self {
            handle,
            kind,
            key_paths,
            unique: false,
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Serializable summary of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    /// Handle text, `<collection-id>/<local-id>`.
    pub id: String,
    /// Index type.
    #[serde(rename = "type")]
    pub kind: IndexKind,
    /// Key paths.
    pub fields: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Number of key-document pairs.
    pub size: usize,
}
