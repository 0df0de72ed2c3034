//! Edge collections.

use crate::collection::{describe, Collection, CollectionCore, CollectionKind};
use crate::config::Config;
use crate::document::{Document, DocumentStore, MemoryDocumentStore};
use crate::error::{CoreError, CoreResult};
use crate::index::IndexKind;
use crate::predicate::eq;
use crate::types::CollectionId;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Field naming the source vertex of an edge.
pub const FROM_FIELD: &str = "_from";
/// Field naming the target vertex of an edge.
pub const TO_FIELD: &str = "_to";

/// A collection of edges.
///
/// Every document carries non-empty text `_from` and `_to` fields. Hash
/// indexes on both are registered at creation, as `<id>/1` and `<id>/2`.
#[derive(Debug)]
pub struct EdgeCollection {
    core: CollectionCore,
}

impl EdgeCollection {
    /// Creates a new-born edge collection over a store.
    ///
    /// # Errors
    ///
    /// Store faults while indexing documents already in the store.
    pub fn new(
        id: CollectionId,
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        config: Config,
    ) -> CoreResult<Self> {
        let core = CollectionCore::new(id, name, store, config);
        core.register_builtin(IndexKind::Hash, vec![FROM_FIELD.to_string()])?;
        core.register_builtin(IndexKind::Hash, vec![TO_FIELD.to_string()])?;
        Ok(Self { core })
    }

    /// Creates a new-born edge collection backed by memory.
    pub fn in_memory(id: CollectionId, name: impl Into<String>) -> CoreResult<Self> {
        Self::new(id, name, Arc::new(MemoryDocumentStore::new()), Config::default())
    }

    /// Returns the edges leaving `vertex`.
    pub fn outbound(&self, vertex: &str) -> CoreResult<Vec<Document>> {
        self.core.query(FROM_FIELD, eq(vertex))?.to_vec()
    }

    /// Returns the edges arriving at `vertex`.
    pub fn inbound(&self, vertex: &str) -> CoreResult<Vec<Document>> {
        self.core.query(TO_FIELD, eq(vertex))?.to_vec()
    }

    /// Returns the edges touching `vertex` in either direction.
    ///
    /// Self-loops are reported once.
    pub fn edges(&self, vertex: &str) -> CoreResult<Vec<Document>> {
        let mut edges = self.outbound(vertex)?;
        let mut seen: HashSet<_> = edges.iter().map(Document::id).collect();
        for edge in self.inbound(vertex)? {
            if seen.insert(edge.id()) {
                edges.push(edge);
            }
        }
        Ok(edges)
    }
}

fn check_vertex(body: &Value, field: &str) -> CoreResult<()> {
    match body.get(field) {
        Some(Value::Text(vertex)) if !vertex.is_empty() => Ok(()),
        Some(other) => Err(CoreError::invalid_document(format!(
            "{field} must be non-empty text, got {}",
            other.type_name()
        ))),
        None => Err(CoreError::invalid_document(format!(
            "edge is missing {field}"
        ))),
    }
}

impl Collection for EdgeCollection {
    fn core(&self) -> &CollectionCore {
        &self.core
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Edge
    }

    fn validate(&self, body: &Value) -> CoreResult<()> {
        check_vertex(body, FROM_FIELD)?;
        check_vertex(body, TO_FIELD)
    }
}

impl fmt::Display for EdgeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, self.kind(), &self.core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn edge(from: &str, to: &str) -> Value {
        Value::object([(FROM_FIELD, from), (TO_FIELD, to)])
    }

    fn knows() -> EdgeCollection {
        let knows = EdgeCollection::in_memory(CollectionId::new(7), "knows").unwrap();
        knows.load().unwrap();
        knows
    }

    #[test]
    fn builtin_indexes() {
        let knows = knows();
        let indexes = knows.indexes().unwrap();
        let ids: Vec<_> = indexes.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["7/0", "7/1", "7/2"]);
        assert_eq!(indexes[1].fields, vec![FROM_FIELD.to_string()]);
        assert_eq!(indexes[2].kind, IndexKind::Hash);
    }

    #[test]
    fn validation() {
        let knows = knows();
        let missing = Value::object([(FROM_FIELD, "a")]);
        assert_eq!(
            knows.insert(missing).unwrap_err().kind(),
            ErrorKind::InvalidDocument
        );
        let wrong = Value::object([(FROM_FIELD, Value::from("a")), (TO_FIELD, Value::Integer(1))]);
        assert_eq!(
            knows.insert(wrong).unwrap_err().kind(),
            ErrorKind::InvalidDocument
        );
        assert!(knows.insert(edge("a", "b")).is_ok());
    }

    #[test]
    fn traversal() {
        let knows = knows();
        let ab = knows.insert(edge("a", "b")).unwrap();
        let ca = knows.insert(edge("c", "a")).unwrap();
        let aa = knows.insert(edge("a", "a")).unwrap();
        knows.insert(edge("b", "c")).unwrap();

        let mut out: Vec<_> = knows.outbound("a").unwrap().iter().map(Document::id).collect();
        out.sort();
        let mut expected = vec![ab, aa];
        expected.sort();
        assert_eq!(out, expected);

        let mut all: Vec<_> = knows.edges("a").unwrap().iter().map(Document::id).collect();
        all.sort();
        let mut expected = vec![ab, ca, aa];
        expected.sort();
        assert_eq!(all, expected);

        assert!(knows.inbound("z").unwrap().is_empty());
        assert!(knows.stats().lookups > 0);
    }

    #[test]
    fn display() {
        let knows = knows();
        knows.unload().unwrap();
        assert_eq!(
            knows.to_string(),
            r#"[EdgeCollection 7, "knows" (status unloaded)]"#
        );
    }
}
