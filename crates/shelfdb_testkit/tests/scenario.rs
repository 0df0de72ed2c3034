//! The `people` scenario: collection `100`, ordered index `100/1` on `age`.

use shelfdb_core::predicate::{crange, eq, ge, lt, orange, range};
use shelfdb_core::{
    Collection, CollectionStatus, CollectionTarget, Config, Database, ErrorKind, IndexKind,
    IndexRef, TruncateMode, Value,
};
use shelfdb_testkit::prelude::*;

#[test]
fn ranges_over_ages() {
    with_temp_db(|db| {
        let people = scenarios::age_collection(db, &[5, 10, 15]);
        let (d1, d2, d3) = (people.ids[0], people.ids[1], people.ids[2]);
        let index = db.index("100/1").unwrap().unwrap();

        assert_eq!(index.lookup(range(5, 15)).to_vec().unwrap(), vec![d1, d2]);
        assert_eq!(index.lookup(crange(5, 15)).to_vec().unwrap(), vec![d1, d2, d3]);
        assert_eq!(index.lookup(orange(5, 15)).to_vec().unwrap(), vec![d2]);
        assert_eq!(index.lookup(ge(10)).to_vec().unwrap(), vec![d2, d3]);
        assert_eq!(index.lookup(lt(5)).to_vec().unwrap(), vec![]);
        assert_eq!(index.lookup(eq(15)).to_vec().unwrap(), vec![d3]);

        let hits = people.collection.query("age", range(5, 15)).unwrap();
        assert_eq!(hits.plan().index, Some(index.handle()));
        let names: Vec<_> = hits
            .map(|d| d.unwrap().body().get("name").cloned().unwrap())
            .collect();
        assert_eq!(names, vec![Value::from("d1"), Value::from("d2")]);
    });
}

#[test]
fn dropping_indexes_by_handle() {
    with_temp_db(|db| {
        scenarios::age_collection(db, &[5, 10, 15]);

        assert_eq!(
            db.drop_index("100/0").unwrap_err().kind(),
            ErrorKind::IndexProtected
        );
        assert!(db.drop_index("100/1").unwrap());
        assert!(db.index("100/1").unwrap().is_none());
        assert!(db.index("100/0").unwrap().is_some());

        // The field is still queryable, now by scanning.
        let people = db.collection("people").unwrap();
        let hits = people.query("age", crange(5, 15)).unwrap();
        assert!(hits.plan().unindexed);
        assert_eq!(hits.to_vec().unwrap().len(), 3);
    });
}

#[test]
fn handles_of_unknown_collections() {
    with_temp_db(|db| {
        scenarios::age_collection(db, &[5]);
        assert_eq!(
            db.index("7/1").unwrap_err().kind(),
            ErrorKind::CollectionNotFound
        );
        assert_eq!(
            db.index("people/1").unwrap_err().kind(),
            ErrorKind::MalformedIndexHandle
        );
    });
}

#[test]
fn handles_with_leading_zeros_name_nothing() {
    with_temp_db(|db| {
        scenarios::age_collection(db, &[5]);
        assert!(db.index("100/1").unwrap().is_some());
        assert!(db.index("100/01").unwrap().is_none());
        assert!(db.index("0100/1").unwrap().is_none());
        assert!(!db.drop_index("100/01").unwrap());
        assert!(db.index("100/1").unwrap().is_some());
    });
}

#[test]
fn collection_level_handles_accept_local_ids() {
    with_temp_db(|db| {
        let people = scenarios::age_collection(db, &[5]);
        let by_local = people.collection.index(&IndexRef::from("1")).unwrap();
        assert_eq!(by_local.unwrap().handle(), people.index.handle());

        // Another collection's handle names nothing here.
        assert!(people
            .collection
            .index(&IndexRef::from("7/1"))
            .unwrap()
            .is_none());

        let descriptors = people.collection.indexes().unwrap();
        let by_descriptor = people
            .collection
            .index(&IndexRef::from(&descriptors[1]))
            .unwrap()
            .unwrap();
        assert_eq!(by_descriptor.kind(), IndexKind::Ordered);
    });
}

#[test]
fn unload_and_reload_rebuilds_indexes() {
    with_temp_db(|db| {
        let people = scenarios::age_collection(db, &[5, 10, 15]);
        let collection = &people.collection;

        collection.unload().unwrap();
        assert_eq!(collection.status(), CollectionStatus::Unloaded);
        assert_eq!(people.index.len(), 0);
        assert_eq!(
            collection.query("age", ge(0)).unwrap_err().kind(),
            ErrorKind::CollectionNotLoaded
        );

        collection.load().unwrap();
        assert_eq!(people.index.len(), 3);
        let hits = collection.query("age", ge(10)).unwrap().to_vec().unwrap();
        assert_eq!(sorted_ids(&hits), sorted(people.ids[1..].to_vec()));
    });
}

#[test]
fn truncate_and_drop_through_the_catalog() {
    let db = TestDatabase::with_config(Config::new().truncate_mode(TruncateMode::Strict));
    let people = scenarios::age_collection(&db, &[5, 10, 15]);

    assert_eq!(db.truncate(CollectionTarget::from("100")).unwrap(), Some(3));
    assert!(people.index.is_empty());
    assert_eq!(people.collection.indexes().unwrap().len(), 2);

    assert!(db.drop_collection("people").unwrap());
    assert_eq!(people.collection.status(), CollectionStatus::Deleted);
    assert_eq!(
        db.index("100/1").unwrap_err().kind(),
        ErrorKind::CollectionNotFound
    );
}
