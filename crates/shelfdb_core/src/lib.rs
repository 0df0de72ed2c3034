//! # ShelfDB Core
//!
//! Collections of schemaless documents with secondary indexes.
//!
//! This crate provides:
//! - Dynamic [`Value`]s with a total storage order
//! - Range predicates (`eq`, `lt`, `le`, `gt`, `ge`, `range`, `orange`, `crange`)
//! - Ordered and hash indexes with lazy, restartable range lookups
//! - A per-collection [`IndexRegistry`] with a protected primary index
//! - Document and edge collections with a load/unload status machine
//! - A [`Database`] catalog resolving collection names, ids and index handles

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod database;
mod document;
mod error;
mod index;
pub mod predicate;
mod types;
mod value;

pub use collection::{
    Collection, CollectionCore, CollectionKind, CollectionStatus, DocumentCollection,
    EdgeCollection, QueryCursor, QueryPlan, FROM_FIELD, TO_FIELD,
};
pub use config::{Config, TruncateMode};
pub use database::{CollectionSpec, CollectionTarget, Database};
pub use document::{Document, DocumentId, DocumentStore, MemoryDocumentStore};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use index::{
    HashIndex, Index, IndexDescriptor, IndexHandle, IndexKey, IndexKind, IndexRef, IndexRegistry,
    IndexScan, IndexSpec, IndexStats, IndexStructure, Lookup, OrderedIndex, PRIMARY_KEY_PATH,
};
pub use predicate::{Operator, Predicate, Range};
pub use types::{CollectionId, LocalIndexId};
pub use value::Value;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
