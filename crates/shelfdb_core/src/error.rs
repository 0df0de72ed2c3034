//! Error types for ShelfDB core.

use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ShelfDB core operations.
///
/// Expected absence (an unknown index id, an unresolved collection name) is
/// never reported through this type; those operations return `None` or
/// `false` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Index handle does not have the `<collection-id>/<index-id>` shape.
    #[error("malformed index handle: {handle:?}")]
    MalformedIndexHandle {
        /// The rejected handle.
        handle: String,
    },

    /// Collection not found.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name or id of the collection.
        name: String,
    },

    /// The primary index cannot be dropped.
    #[error("index {id} is the primary index and cannot be dropped")]
    IndexProtected {
        /// Handle of the protected index.
        id: String,
    },

    /// Unique constraint violation.
    #[error("duplicate key {key} in unique index {index}")]
    DuplicateKey {
        /// Handle of the index.
        index: String,
        /// The conflicting key.
        key: String,
    },

    /// A unique index with identical key paths already exists.
    #[error("a unique index on {key_paths:?} already exists as {existing}")]
    DuplicateIndexDefinition {
        /// The requested key paths.
        key_paths: Vec<String>,
        /// Handle of the existing index.
        existing: String,
    },

    /// Comparison between incompatible value types.
    #[error("type mismatch: cannot compare {found} with {expected}")]
    TypeMismatch {
        /// Kind of the predicate operand.
        expected: &'static str,
        /// Kind of the key met during the scan.
        found: &'static str,
    },

    /// Collection is not in the loaded state.
    #[error("collection {name} is not loaded (status {status})")]
    CollectionNotLoaded {
        /// Name of the collection.
        name: String,
        /// Current status name.
        status: String,
    },

    /// The document set changed under a running truncate.
    #[error("collection {name} was modified during truncate: expected {expected} documents, found {actual}")]
    ConcurrentModification {
        /// Name of the collection.
        name: String,
        /// Document count truncate expected.
        expected: usize,
        /// Document count observed.
        actual: usize,
    },

    /// Predicate list does not form a valid range.
    #[error("invalid range: {message}")]
    InvalidRange {
        /// Description of the problem.
        message: String,
    },

    /// Document body is not acceptable for the collection.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Description of the problem.
        message: String,
    },

    /// Collection status transition is not allowed.
    #[error("invalid status transition for {name}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Name of the collection.
        name: String,
        /// Current status name.
        from: &'static str,
        /// Requested status name.
        to: &'static str,
    },

    /// Operation not permitted.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Unrecoverable document store fault.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the fault.
        message: String,
    },
}

/// Machine-readable classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`CoreError::MalformedIndexHandle`].
    MalformedIndexHandle,
    /// See [`CoreError::CollectionNotFound`].
    CollectionNotFound,
    /// See [`CoreError::IndexProtected`].
    IndexProtected,
    /// See [`CoreError::DuplicateKey`].
    DuplicateKey,
    /// See [`CoreError::DuplicateIndexDefinition`].
    DuplicateIndexDefinition,
    /// See [`CoreError::TypeMismatch`].
    TypeMismatch,
    /// See [`CoreError::CollectionNotLoaded`].
    CollectionNotLoaded,
    /// See [`CoreError::ConcurrentModification`].
    ConcurrentModification,
    /// See [`CoreError::InvalidRange`].
    InvalidRange,
    /// See [`CoreError::InvalidDocument`].
    InvalidDocument,
    /// See [`CoreError::InvalidStatusTransition`].
    InvalidStatusTransition,
    /// See [`CoreError::InvalidOperation`].
    InvalidOperation,
    /// See [`CoreError::Storage`].
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl CoreError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedIndexHandle { .. } => ErrorKind::MalformedIndexHandle,
            Self::CollectionNotFound { .. } => ErrorKind::CollectionNotFound,
            Self::IndexProtected { .. } => ErrorKind::IndexProtected,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::DuplicateIndexDefinition { .. } => ErrorKind::DuplicateIndexDefinition,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::CollectionNotLoaded { .. } => ErrorKind::CollectionNotLoaded,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::InvalidDocument { .. } => ErrorKind::InvalidDocument,
            Self::InvalidStatusTransition { .. } => ErrorKind::InvalidStatusTransition,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Creates a malformed index handle error.
    pub fn malformed_handle(handle: impl Into<String>) -> Self {
        Self::MalformedIndexHandle {
            handle: handle.into(),
        }
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates an invalid range error.
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = CoreError::malformed_handle("abc");
        assert_eq!(err.kind(), ErrorKind::MalformedIndexHandle);
        assert_eq!(err.to_string(), "malformed index handle: \"abc\"");
    }

    #[test]
    fn kind_display() {
        assert_eq!(ErrorKind::IndexProtected.to_string(), "IndexProtected");
    }
}
