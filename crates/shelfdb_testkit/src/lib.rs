//! # ShelfDB Testkit
//!
//! Test utilities for ShelfDB.
//!
//! This crate provides:
//! - Test databases and pre-populated collections
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use shelfdb_testkit::prelude::*;
//! use shelfdb_core::predicate::range;
//! use shelfdb_core::Collection;
//!
//! with_temp_db(|db| {
//!     let people = scenarios::age_collection(db, &[5, 10, 15]);
//!     let hits = people.collection.query("age", range(5, 15)).unwrap().to_vec().unwrap();
//!     assert_eq!(hits.len(), 2);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
