//! Core type definitions for ShelfDB.

use serde::Serialize;
use std::fmt;

/// Identifier for a collection.
///
/// Collection IDs are stable and assigned when collections are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CollectionId(pub u64);

impl CollectionId {
    /// Creates a new collection ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an index within its collection.
///
/// Local ids are allocated monotonically and never reused. The primary
/// index always has [`LocalIndexId::PRIMARY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LocalIndexId(pub u64);

impl LocalIndexId {
    /// Local id of every collection's primary index.
    pub const PRIMARY: Self = Self(0);

    /// Creates a new local index ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the primary index id.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.0 == Self::PRIMARY.0
    }
}

impl fmt::Display for LocalIndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_id_display() {
        let c = CollectionId::new(42);
        assert_eq!(format!("{c}"), "42");
    }

    #[test]
    fn local_index_id_primary() {
        assert!(LocalIndexId::PRIMARY.is_primary());
        assert!(!LocalIndexId::new(3).is_primary());
        assert!(LocalIndexId::new(1) < LocalIndexId::new(2));
    }
}
