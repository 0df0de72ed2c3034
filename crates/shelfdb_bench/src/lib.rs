//! Benchmark utilities.

use rand::Rng;
use shelfdb_core::{Collection, CollectionSpec, Database, IndexKind, Value};
use std::sync::Arc;

/// Generates `count` random ages in `0..max`.
pub fn random_ages(count: usize, max: i64) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(0..max)).collect()
}

/// Builds a document body `{age, name}`.
pub fn person(age: i64) -> Value {
    Value::object([("age", Value::Integer(age)), ("name", Value::from(format!("p{age}")))])
}

/// Creates a collection named `bench`, optionally indexed on `age`, filled
/// with one document per age.
pub fn people(db: &Database, index: Option<IndexKind>, ages: &[i64]) -> Arc<dyn Collection> {
    let collection = db
        .create(CollectionSpec::new("bench"))
        .expect("Failed to create collection");
    if let Some(kind) = index {
        collection
            .ensure_index(kind, vec!["age".to_string()], false)
            .expect("Failed to create index");
    }
    for &age in ages {
        collection.insert(person(age)).expect("Failed to insert document");
    }
    collection
}
