//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use shelfdb_core::{Config, Database, Document, DocumentId, TruncateMode};

/// A database owned by a test.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
}

impl TestDatabase {
    /// Creates an empty database with the default configuration.
    pub fn memory() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty database whose truncates run in strict mode.
    pub fn strict() -> Self {
        Self::with_config(Config::new().truncate_mode(TruncateMode::Strict))
    }

    /// Creates an empty database.
    pub fn with_config(config: Config) -> Self {
        Self {
            db: Database::with_config(config),
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a fresh database.
///
/// # Example
///
/// ```rust
/// use shelfdb_core::CollectionSpec;
/// use shelfdb_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     db.create(CollectionSpec::new("test")).unwrap();
///     assert!(db.collection("test").is_some());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Returns the ids of documents, sorted.
pub fn sorted_ids(documents: &[Document]) -> Vec<DocumentId> {
    let mut ids: Vec<_> = documents.iter().map(Document::id).collect();
    ids.sort();
    ids
}

/// Sorts a list of ids.
pub fn sorted(mut ids: Vec<DocumentId>) -> Vec<DocumentId> {
    ids.sort();
    ids
}

/// Test scenario helpers.
pub mod scenarios {
    use shelfdb_core::{
        Collection, CollectionSpec, Database, DocumentId, Index, IndexKind, Value,
    };
    use std::sync::Arc;

    /// Id of the scenario collection.
    pub const PEOPLE_ID: u64 = 100;

    /// Name of the scenario collection.
    pub const PEOPLE: &str = "people";

    /// A collection with an ordered index on `age`.
    pub struct AgeCollection {
        /// The collection, created as `100`.
        pub collection: Arc<dyn Collection>,
        /// The ordered index, `100/1`.
        pub index: Arc<Index>,
        /// Document ids in insertion order.
        pub ids: Vec<DocumentId>,
    }

    /// Creates collection `100` named `people` with an ordered index on
    /// `age` and one document per age, named `d1`, `d2`, ...
    pub fn age_collection(db: &Database, ages: &[i64]) -> AgeCollection {
        let collection = db
            .create(CollectionSpec::new(PEOPLE).id(PEOPLE_ID))
            .expect("Failed to create collection");
        let index = collection
            .ensure_index(IndexKind::Ordered, vec!["age".to_string()], false)
            .expect("Failed to create index");

        let ids = ages
            .iter()
            .enumerate()
            .map(|(i, &age)| {
                let body = Value::object([
                    ("name", Value::from(format!("d{}", i + 1))),
                    ("age", Value::Integer(age)),
                ]);
                collection.insert(body).expect("Failed to insert document")
            })
            .collect();

        AgeCollection {
            collection,
            index,
            ids,
        }
    }

    /// Creates a collection holding `count` documents `{index: i, group: i % 10}`.
    pub fn populated_collection(db: &Database, name: &str, count: usize) -> Arc<dyn Collection> {
        let collection = db
            .create(CollectionSpec::new(name))
            .expect("Failed to create collection");
        for i in 0..count {
            let i = i as i64;
            collection
                .insert(Value::object([("index", i), ("group", i % 10)]))
                .expect("Failed to insert document");
        }
        collection
    }
}
