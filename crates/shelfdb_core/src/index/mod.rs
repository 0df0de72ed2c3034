//! Secondary indexes and the per-collection registry.
//!
//! Every collection owns an [`IndexRegistry`]. The registry always holds the
//! primary index (`<collection-id>/0`, unique, on `_id`) and any number of
//! user indexes, each addressed by an [`IndexHandle`].
//!
//! # Index Types
//!
//! - [`OrderedIndex`]: sorted keys, serves every range
//! - [`HashIndex`]: equality lookups; also backs the primary index
//!
//! Range lookups are lazy: [`Index::lookup`] returns a [`Lookup`] that can be
//! iterated any number of times, each pass reading the index afresh.

mod definition;
mod handle;
mod hash;
mod instance;
mod ordered;
mod registry;
mod scan;
mod traits;

pub use definition::{IndexDescriptor, IndexKind, IndexSpec};
pub use handle::{IndexHandle, IndexRef};
pub use hash::HashIndex;
pub use instance::Index;
pub use ordered::OrderedIndex;
pub use registry::{IndexRegistry, IndexStats, PRIMARY_KEY_PATH};
pub use scan::{IndexScan, Lookup};
pub use traits::{IndexKey, IndexStructure};

pub(crate) use handle::{is_handle_shaped, ParsedHandle};
