//! Query plans and result cursors.

use crate::document::{Document, DocumentId, DocumentStore};
use crate::error::CoreResult;
use crate::index::{IndexHandle, IndexScan};
use crate::predicate::Range;
use crate::types::CollectionId;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::vec;

/// How a query is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    /// Queried collection.
    pub collection: CollectionId,
    /// Queried field path.
    pub field: String,
    /// The range, as text.
    pub range: String,
    /// Index serving the query, if any.
    pub index: Option<IndexHandle>,
    /// True if every document is scanned.
    pub unindexed: bool,
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(handle) => write!(f, "index {handle} on {} {}", self.field, self.range),
            None => write!(f, "full scan of {} on {} {}", self.collection, self.field, self.range),
        }
    }
}

enum Source {
    Index(IndexScan),
    Scan {
        ids: vec::IntoIter<DocumentId>,
        field: String,
        range: Range,
    },
}

/// Documents matching a query, resolved lazily from the store.
///
/// Ids whose document has vanished from the store by the time it is
/// resolved are skipped. After an `Err` item the cursor is exhausted.
pub struct QueryCursor {
    plan: QueryPlan,
    store: Arc<dyn DocumentStore>,
    source: Source,
    done: bool,
}

impl QueryCursor {
    pub(crate) fn indexed(plan: QueryPlan, store: Arc<dyn DocumentStore>, scan: IndexScan) -> Self {
        Self {
            plan,
            store,
            source: Source::Index(scan),
            done: false,
        }
    }

    pub(crate) fn full_scan(
        plan: QueryPlan,
        store: Arc<dyn DocumentStore>,
        ids: Vec<DocumentId>,
        range: Range,
    ) -> Self {
        let field = plan.field.clone();
        Self {
            plan,
            store,
            source: Source::Scan {
                ids: ids.into_iter(),
                field,
                range,
            },
            done: false,
        }
    }

    /// Returns the plan.
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Collects the remaining documents.
    ///
    /// # Errors
    ///
    /// The first error the cursor yields.
    pub fn to_vec(self) -> CoreResult<Vec<Document>> {
        self.collect()
    }
}

fn keep_if_matching(document: Document, field: &str, range: &Range) -> CoreResult<Option<Document>> {
    let matched = match document.field(field) {
        Some(value) => range.matches(&value)?,
        None => false,
    };
    Ok(matched.then_some(document))
}

impl Iterator for QueryCursor {
    type Item = CoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let step = match &mut self.source {
                Source::Index(scan) => scan
                    .next()
                    .map(|id| id.and_then(|id| self.store.get(id))),
                Source::Scan { ids, field, range } => ids.next().map(|id| {
                    self.store.get(id).and_then(|document| match document {
                        Some(document) => keep_if_matching(document, field, range),
                        None => Ok(None),
                    })
                }),
            };

            match step {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Ok(Some(document))) => return Some(Ok(document)),
                Some(Ok(None)) => {}
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl fmt::Debug for QueryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCursor")
            .field("plan", &self.plan)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
