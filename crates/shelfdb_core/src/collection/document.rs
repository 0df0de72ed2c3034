//! Plain document collections.

use crate::collection::{describe, Collection, CollectionCore, CollectionKind};
use crate::config::Config;
use crate::document::{DocumentStore, MemoryDocumentStore};
use crate::types::CollectionId;
use std::fmt;
use std::sync::Arc;

/// A collection of plain documents.
#[derive(Debug)]
pub struct DocumentCollection {
    core: CollectionCore,
}

impl DocumentCollection {
    /// Creates a new-born collection over a store.
    pub fn new(
        id: CollectionId,
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        config: Config,
    ) -> Self {
        Self {
            core: CollectionCore::new(id, name, store, config),
        }
    }

    /// Creates a new-born collection backed by memory.
    pub fn in_memory(id: CollectionId, name: impl Into<String>) -> Self {
        Self::new(id, name, Arc::new(MemoryDocumentStore::new()), Config::default())
    }
}

impl Collection for DocumentCollection {
    fn core(&self) -> &CollectionCore {
        &self.core
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Document
    }
}

impl fmt::Display for DocumentCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, self.kind(), &self.core)
    }
}
