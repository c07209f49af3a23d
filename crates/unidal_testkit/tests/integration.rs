//! End-to-end exercises of the session contracts against [`MemoryDb`].

use serde_json::json;
use unidal_core::{
    insert_with_random_id, random_string_id, read_all_ids, read_all_records, CollectionRef,
    Condition, Context, DalError, Database, Deleter, Getter, IdKind, IdValue, InsertOptions,
    Inserter, Key, Operator, Precondition, Record, Select, Selector, Setter, Transaction,
    TransactionCoordinator, TransactionOptions, Update, Updater, Upserter,
};
use unidal_testkit::MemoryDb;

fn seed_users(db: &MemoryDb, ctx: &Context) {
    let users = [
        ("u1", json!({"email": "ann@example.com", "age": 34})),
        ("u2", json!({"email": "bob@example.com", "age": 19})),
        ("u3", json!({"email": "cee@example.com", "age": 27})),
    ];
    for (id, data) in users {
        let mut record = Record::with_data(Key::with_string_id("users", id), data);
        db.insert(ctx, &mut record, InsertOptions::new()).unwrap();
    }
}

#[test]
fn crud_through_the_database_contract() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    seed_users(&db, &ctx);

    // Read back through a trait object to prove the blanket
    // composition holds.
    let session: &dyn Database = &db;
    let mut record = Record::new(Key::with_string_id("users", "u2"));
    session.get(&ctx, &mut record).unwrap();
    assert!(record.exists());
    assert_eq!(record.data()["age"], json!(19));

    session
        .update(
            &ctx,
            &Key::with_string_id("users", "u2"),
            &[Update::set("age", json!(20))],
            &[Precondition::Exists],
        )
        .unwrap();
    session.get(&ctx, &mut record).unwrap();
    assert_eq!(record.data()["age"], json!(20));

    session
        .delete(&ctx, &Key::with_string_id("users", "u2"))
        .unwrap();
    let mut gone = Record::new(Key::with_string_id("users", "u2"));
    session.get(&ctx, &mut gone).unwrap();
    assert!(!gone.exists());
    assert_eq!(db.len("users"), 2);
}

#[test]
fn select_filters_and_limits() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    seed_users(&db, &ctx);

    let query = Select::from(CollectionRef::root("users"))
        .filter(Condition::compare("age", Operator::GreaterOrEqual, json!(21)));
    let mut reader = db.select(&ctx, &query).unwrap();
    let records = read_all_records(reader.as_mut(), 0).unwrap();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(record.exists());
        assert!(record.data()["age"].as_i64().unwrap() >= 21);
    }

    let limited = Select::from(CollectionRef::root("users")).limit(1);
    let mut reader = db.select(&ctx, &limited).unwrap();
    let ids = read_all_ids(reader.as_mut(), 0).unwrap();
    assert_eq!(ids, vec![IdValue::String("u1".to_owned())]);
}

#[test]
fn select_with_int_ids_parses_identifiers() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    for id in [7_i64, 42] {
        let mut record = Record::with_data(Key::builder("counters").int_id(id).build(), json!({}));
        db.insert(&ctx, &mut record, InsertOptions::new()).unwrap();
    }

    let query = Select::from(CollectionRef::root("counters")).id_kind(IdKind::Int);
    let mut reader = db.select(&ctx, &query).unwrap();
    let ids = read_all_ids(reader.as_mut(), 0).unwrap();
    assert_eq!(ids, vec![IdValue::Int(42), IdValue::Int(7)]);
}

#[test]
fn readonly_transaction_scopes_the_context() {
    let db = MemoryDb::new();
    let outer = Context::background();
    seed_users(&db, &outer);
    assert!(!outer.in_transaction());

    db.run_readonly_transaction(
        &outer,
        &mut |ctx, tx| {
            assert!(ctx.in_transaction());
            assert!(tx.options().is_readonly());
            let mut record = Record::new(Key::with_string_id("users", "u1"));
            tx.get(ctx, &mut record)?;
            assert!(record.exists());
            Ok(())
        },
        TransactionOptions::new(),
    )
    .unwrap();
    assert!(!outer.in_transaction());
}

#[test]
fn readwrite_transaction_applies_writes() {
    let db = MemoryDb::new();
    let outer = Context::background();

    db.run_readwrite_transaction(
        &outer,
        &mut |ctx, tx| {
            assert!(!tx.options().is_readonly());
            let mut record =
                Record::with_data(Key::with_string_id("users", "u9"), json!({"age": 50}));
            tx.insert(ctx, &mut record, InsertOptions::new())
        },
        TransactionOptions::new().cross_group(),
    )
    .unwrap();

    let mut record = Record::new(Key::with_string_id("users", "u9"));
    db.get(&outer, &mut record).unwrap();
    assert!(record.exists());
}

#[test]
fn transaction_worker_errors_propagate() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    let err = db
        .run_readwrite_transaction(
            &ctx,
            &mut |_ctx, _tx| Err(DalError::backend("boom")),
            TransactionOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(err, DalError::Backend(_)));
}

#[test]
fn insert_with_random_id_lands_a_fresh_record() {
    let db = MemoryDb::new();
    let ctx = Context::background();

    let mut record = Record::with_data(
        Key::with_string_id("users", "placeholder"),
        json!({"email": "new@example.com"}),
    );
    let generator = random_string_id(12);
    let probe_db = db.clone();
    let insert_db = db.clone();
    let probe_ctx = ctx.clone();
    let insert_ctx = ctx.clone();
    insert_with_random_id(
        &ctx,
        &mut record,
        generator.as_ref(),
        5,
        move |key| {
            let mut probe = Record::new(key.clone());
            probe_db.get(&probe_ctx, &mut probe)?;
            if probe.exists() {
                Ok(())
            } else {
                Err(DalError::record_not_found(key))
            }
        },
        move |record| insert_db.insert(&insert_ctx, record, InsertOptions::new()),
    )
    .unwrap();

    let IdValue::String(id) = record.key().id().clone() else {
        panic!("expected a string id");
    };
    assert_eq!(id.len(), 12);
    let mut loaded = Record::new(Key::with_string_id("users", id));
    db.get(&ctx, &mut loaded).unwrap();
    assert!(loaded.exists());
}

#[test]
fn upsert_overwrites_and_set_is_an_alias() {
    let db = MemoryDb::new();
    let ctx = Context::background();

    let key = Key::with_string_id("users", "u1");
    let mut first = Record::with_data(key.clone(), json!({"age": 1}));
    db.upsert(&ctx, &mut first).unwrap();
    let mut second = Record::with_data(key.clone(), json!({"age": 2}));
    db.set(&ctx, &mut second).unwrap();

    let mut loaded = Record::new(key);
    db.get(&ctx, &mut loaded).unwrap();
    assert_eq!(loaded.data(), &json!({"age": 2}));
}

#[test]
fn update_of_missing_record_reports_not_found() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    let err = db
        .update(
            &ctx,
            &Key::with_string_id("users", "ghost"),
            &[Update::set("age", json!(1))],
            &[],
        )
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn delete_of_missing_record_is_idempotent() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    db.delete(&ctx, &Key::with_string_id("users", "ghost"))
        .unwrap();
}

#[test]
fn nested_collection_select() {
    let db = MemoryDb::new();
    let ctx = Context::background();
    let team = Key::with_string_id("teams", "t1");
    let key = Key::builder("members")
        .string_id("m1")
        .parent(team.clone())
        .build();
    let mut record = Record::with_data(key, json!({"role": "admin"}));
    db.insert(&ctx, &mut record, InsertOptions::new()).unwrap();

    let query = Select::from(CollectionRef::nested("members", team.clone()));
    let mut reader = db.select(&ctx, &query).unwrap();
    let records = read_all_records(reader.as_mut(), 0).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key().parent(), Some(&team));
}
