//! Index handles and references.

use crate::error::{CoreError, CoreResult};
use crate::index::definition::IndexDescriptor;
use crate::types::{CollectionId, LocalIndexId};
use serde::Serialize;
use std::fmt;

/// Identity of an index: `<collection-id>/<local-id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct IndexHandle {
    collection: CollectionId,
    local: LocalIndexId,
}

impl IndexHandle {
    /// Creates a handle.
    #[must_use]
    pub const fn new(collection: CollectionId, local: LocalIndexId) -> Self {
        Self { collection, local }
    }

    /// Returns the owning collection id.
    #[must_use]
    pub const fn collection(&self) -> CollectionId {
        self.collection
    }

    /// Returns the id within the collection.
    #[must_use]
    pub const fn local(&self) -> LocalIndexId {
        self.local
    }

    /// Returns true if this names a primary index.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.local.is_primary()
    }
}

impl fmt::Display for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.local)
    }
}

impl From<IndexHandle> for String {
    fn from(handle: IndexHandle) -> Self {
        handle.to_string()
    }
}

/// Caller-supplied reference to an index.
///
/// Either the raw handle text or a descriptor-like value carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRef {
    /// Handle text such as `"100/1"`.
    RawId(String),
    /// A value carrying the handle in its `id` field.
    Descriptor {
        /// Handle text.
        id: String,
    },
}

impl IndexRef {
    /// Returns the handle text.
    pub fn id(&self) -> &str {
        match self {
            IndexRef::RawId(id) | IndexRef::Descriptor { id } => id,
        }
    }

    /// Parses the handle text.
    pub(crate) fn parse(&self) -> CoreResult<ParsedHandle> {
        ParsedHandle::parse(self.id())
    }
}

impl From<&str> for IndexRef {
    fn from(id: &str) -> Self {
        IndexRef::RawId(id.to_string())
    }
}

impl From<String> for IndexRef {
    fn from(id: String) -> Self {
        IndexRef::RawId(id)
    }
}

impl From<IndexHandle> for IndexRef {
    fn from(handle: IndexHandle) -> Self {
        IndexRef::RawId(handle.to_string())
    }
}

impl From<&IndexDescriptor> for IndexRef {
    fn from(descriptor: &IndexDescriptor) -> Self {
        IndexRef::Descriptor {
            id: descriptor.id.clone(),
        }
    }
}

/// Result of parsing handle text at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParsedHandle {
    /// Collection part.
    pub collection: CollectionId,
    /// Index part, or `None` when the text cannot name an existing index
    /// (trailing characters, leading zeros, out-of-range number).
    pub local: Option<LocalIndexId>,
}

impl ParsedHandle {
    /// Parses text of the shape `<digits>/<digits>...`.
    ///
    /// # Errors
    ///
    /// `MalformedIndexHandle` when the text does not start with the digit
    /// pair; `CollectionNotFound` when the collection part is too large to
    /// name any collection.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let (collection_digits, rest) = split_digits(text);
        let rest = match rest.strip_prefix('/') {
            Some(rest) if !collection_digits.is_empty() => rest,
            _ => return Err(CoreError::malformed_handle(text)),
        };
        let (local_digits, trailing) = split_digits(rest);
        if local_digits.is_empty() {
            return Err(CoreError::malformed_handle(text));
        }

        let collection = collection_digits
            .parse::<u64>()
            .map(CollectionId::new)
            .map_err(|_| CoreError::collection_not_found(collection_digits))?;

        let exact = trailing.is_empty()
            && is_canonical(collection_digits)
            && is_canonical(local_digits);
        let local = if exact {
            local_digits.parse::<u64>().ok().map(LocalIndexId::new)
        } else {
            None
        };

        Ok(Self { collection, local })
    }

    /// Returns the exact handle, if the text named one.
    pub fn handle(&self) -> Option<IndexHandle> {
        self.local.map(|local| IndexHandle::new(self.collection, local))
    }
}

/// Returns true if the text starts with `<digits>/<digits>`.
pub(crate) fn is_handle_shaped(text: &str) -> bool {
    matches!(
        ParsedHandle::parse(text),
        Ok(_) | Err(CoreError::CollectionNotFound { .. })
    )
}

/// Handles are compared as text, so `01` never names index `1`.
fn is_canonical(digits: &str) -> bool {
    digits == "0" || !digits.starts_with('0')
}

fn split_digits(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text.split_at(end)
}
