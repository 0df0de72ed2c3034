//! Lazy range scans over an index.
//!
//! A [`Lookup`] is a restartable description of a scan; every call to
//! [`Lookup::iter`] starts a fresh [`IndexScan`] against the current index
//! contents.
//!
//! Ordered scans hold no lock between pulls. Each pull takes the index's
//! read lock, re-seeks past the last key it produced, and releases the lock
//! with the next key group buffered. Entries inserted behind the cursor are
//! not seen; entries ahead of it are. Hash scans copy the index entries on
//! their first pull.

use crate::document::DocumentId;
use crate::error::CoreResult;
use crate::index::instance::Index;
use crate::index::traits::{IndexKey, IndexStructure};
use crate::predicate::{Position, Range};
use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::Arc;
use std::vec;

/// A restartable range lookup on one index.
#[derive(Debug, Clone)]
pub struct Lookup {
    index: Arc<Index>,
    range: Range,
}

impl Lookup {
    pub(crate) fn new(index: Arc<Index>, range: Range) -> Self {
        Self { index, range }
    }

    /// Returns the scanned index.
    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    /// Returns the range.
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Starts a new scan.
    pub fn iter(&self) -> IndexScan {
        IndexScan {
            index: Arc::clone(&self.index),
            range: self.range.clone(),
            state: ScanState::Start,
            pending: VecDeque::new(),
        }
    }

    /// Runs the scan to completion.
    ///
    /// # Errors
    ///
    /// Returns the first error the scan yields; ids produced before it are
    /// discarded.
    pub fn to_vec(&self) -> CoreResult<Vec<DocumentId>> {
        self.iter().collect()
    }
}

impl IntoIterator for Lookup {
    type Item = CoreResult<DocumentId>;
    type IntoIter = IndexScan;

    fn into_iter(self) -> Self::IntoIter {
        IndexScan {
            index: self.index,
            range: self.range,
            state: ScanState::Start,
            pending: VecDeque::new(),
        }
    }
}

impl IntoIterator for &Lookup {
    type Item = CoreResult<DocumentId>;
    type IntoIter = IndexScan;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
enum ScanState {
    Start,
    After(IndexKey),
    Materialized(vec::IntoIter<(IndexKey, DocumentId)>),
    Done,
}

/// Iterator over the document ids of a [`Lookup`].
///
/// After an `Err` item the iterator is exhausted.
#[derive(Debug)]
pub struct IndexScan {
    index: Arc<Index>,
    range: Range,
    state: ScanState,
    pending: VecDeque<DocumentId>,
}

impl IndexScan {
    /// Buffers the next batch of ids. Returns false once nothing is left.
    fn advance(&mut self) -> CoreResult<bool> {
        match std::mem::replace(&mut self.state, ScanState::Done) {
            ScanState::Done => Ok(false),
            ScanState::Start => {
                let index = Arc::clone(&self.index);
                let structure = index.read();
                if structure.as_ordered().is_some() {
                    let from = match self.seek_key() {
                        Some(key) => Bound::Included(key),
                        None => Bound::Unbounded,
                    };
                    self.step_ordered(&**structure, from)
                } else {
                    self.materialize(&**structure)
                }
            }
            ScanState::After(last) => {
                let index = Arc::clone(&self.index);
                let structure = index.read();
                self.step_ordered(&**structure, Bound::Excluded(last))
            }
            ScanState::Materialized(mut entries) => {
                for (key, id) in entries.by_ref() {
                    if self.range.matches(key.leading())? {
                        self.pending.push_back(id);
                        break;
                    }
                }
                if self.pending.is_empty() {
                    return Ok(false);
                }
                self.state = ScanState::Materialized(entries);
                Ok(true)
            }
        }
    }

    /// Where an ordered scan starts.
    ///
    /// Without a lower bound the scan starts at the smallest key of the
    /// upper operand's kind, so keys of lower-ranked kinds are never
    /// compared.
    fn seek_key(&self) -> Option<IndexKey> {
        self.range
            .seek_operand()
            .cloned()
            .or_else(|| {
                self.range
                    .predicates()
                    .first()
                    .map(|p| p.operand().kind_floor())
            })
            .map(IndexKey::single)
    }

    fn step_ordered(
        &mut self,
        structure: &dyn IndexStructure,
        mut from: Bound<IndexKey>,
    ) -> CoreResult<bool> {
        let Some(ordered) = structure.as_ordered() else {
            return Ok(false);
        };
        loop {
            let Some((key, ids)) = ordered.next_group(from.as_ref()) else {
                return Ok(false);
            };
            // Keys of a later kind than the limit sort after every match.
            if let Some(limit) = self.range.limit_operand() {
                if key.leading().outranks(limit) {
                    return Ok(false);
                }
            }
            match self.range.locate(key.leading())? {
                Position::Below => from = Bound::Excluded(key),
                Position::Inside => {
                    self.pending.extend(ids);
                    self.state = ScanState::After(key);
                    return Ok(true);
                }
                Position::Above => return Ok(false),
            }
        }
    }

    fn materialize(&mut self, structure: &dyn IndexStructure) -> CoreResult<bool> {
        if self.range.is_point() && structure.spec().key_paths.len() == 1 {
            if let Some(operand) = self.range.seek_operand() {
                self.pending
                    .extend(structure.lookup(&IndexKey::single(operand.clone())));
            }
            return Ok(true);
        }
        self.state = ScanState::Materialized(structure.entries().into_iter());
        Ok(true)
    }
}

impl Iterator for IndexScan {
    type Item = CoreResult<DocumentId>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.pending.pop_front() {
                return Some(Ok(id));
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => {
                    self.state = ScanState::Done;
                    return None;
                }
                Err(err) => {
                    self.state = ScanState::Done;
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for IndexScan {}
