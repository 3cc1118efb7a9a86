//! End-to-end command tests against the public API.

use bytes::Bytes;
use ordkv::commands::{Arity, CommandError, CommandTable, Reply, TableError};
use ordkv::protocol::{encode, parse_command};
use ordkv::storage::{MemoryStore, Store, StoreError};

fn args(parts: &[&str]) -> Vec<Bytes> {
    parts.iter().map(|s| Bytes::from(s.to_string())).collect()
}

fn run(table: &CommandTable, store: &MemoryStore, parts: &[&str]) -> Result<Reply, CommandError> {
    let argv = args(&parts[1..]);
    table.dispatch(parts[0].as_bytes(), &argv, store)
}

/// Follows SCAN continuation cursors until exhaustion.
fn scan_all(table: &CommandTable, store: &MemoryStore, tail: &[&str]) -> (Vec<String>, usize) {
    let mut cursor = String::new();
    let mut keys = Vec::new();
    let mut pages = 0;
    loop {
        let mut parts = vec!["scan", cursor.as_str()];
        parts.extend_from_slice(tail);
        let reply = run(table, store, &parts).unwrap();
        pages += 1;

        let page = reply.as_array().unwrap();
        for key in page[1].as_array().unwrap() {
            keys.push(String::from_utf8(key.as_bytes().unwrap().to_vec()).unwrap());
        }
        cursor = String::from_utf8(page[0].as_bytes().unwrap().to_vec()).unwrap();
        if cursor.is_empty() {
            return (keys, pages);
        }
    }
}

#[test]
fn scan_walks_every_key_once_in_order() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();
    let mut expected = Vec::new();
    for i in 0..25 {
        let key = format!("k{:02}", i);
        run(&table, &store, &["set", key.as_str(), "v"]).unwrap();
        expected.push(key);
    }

    let (keys, pages) = scan_all(&table, &store, &["count", "10"]);
    assert_eq!(keys, expected);
    assert_eq!(pages, 3);

    // An exact multiple ends with one extra, empty page.
    let (keys, pages) = scan_all(&table, &store, &["count", "5"]);
    assert_eq!(keys, expected);
    assert_eq!(pages, 6);
}

#[test]
fn scan_with_pattern_filters_across_pages() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();
    for name in ["user:1", "user:2", "session:1", "user:3", "cache:1"] {
        run(&table, &store, &["set", name, "x"]).unwrap();
    }

    let (keys, _) = scan_all(&table, &store, &["MATCH", "user:*", "COUNT", "1"]);
    assert_eq!(keys, vec!["user:1", "user:2", "user:3"]);
}

#[test]
fn scan_inclusive_includes_the_cursor_key() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();
    run(&table, &store, &["mset", "a", "1", "b", "2", "c", "3"]).unwrap();

    let reply = run(&table, &store, &["scan", "b", "count", "5", "INCLUSIVE"]).unwrap();
    assert_eq!(
        reply,
        Reply::array(vec![
            Reply::bulk(Bytes::new()),
            Reply::bulk_array(vec![Some(Bytes::from("b")), Some(Bytes::from("c"))]),
        ])
    );

    let reply = run(&table, &store, &["scan", "b", "count", "5"]).unwrap();
    assert_eq!(
        reply.as_array().unwrap()[1],
        Reply::bulk_array(vec![Some(Bytes::from("c"))])
    );
}

#[test]
fn scan_rejects_malformed_options() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();

    for bad in [
        &["scan", "a", "b"][..],
        &["scan", "a", "count", "5", "extra"][..],
        &["scan", "a", "match", "p", "count"][..],
        &["scan", "a", "count", "1", "match", "p"][..],
        &["scan", "a", "b", "c", "d", "e", "f", "g"][..],
    ] {
        assert_eq!(
            run(&table, &store, bad),
            Err(CommandError::wrong_arity("scan")),
            "{:?}",
            bad
        );
    }

    assert_eq!(
        run(&table, &store, &["scan", "a", "count", "ten"]),
        Err(CommandError::not_an_integer())
    );
}

#[test]
fn scan_options_may_omit_the_cursor() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();
    run(&table, &store, &["mset", "a1", "1", "a2", "2", "b1", "3"]).unwrap();

    let reply = run(&table, &store, &["scan", "count", "5"]).unwrap();
    assert_eq!(reply.as_array().unwrap()[1].as_array().unwrap().len(), 3);

    let reply = run(&table, &store, &["scan", "match", "a*"]).unwrap();
    assert_eq!(
        reply.as_array().unwrap()[1],
        Reply::bulk_array(vec![Some(Bytes::from("a1")), Some(Bytes::from("a2"))])
    );

    let reply = run(&table, &store, &["scan", "match", "a*", "count", "1"]).unwrap();
    assert_eq!(
        reply,
        Reply::array(vec![
            Reply::bulk(Bytes::from("a1")),
            Reply::bulk_array(vec![Some(Bytes::from("a1"))]),
        ])
    );

    let reply = run(&table, &store, &["scan", "a2", "inclusive"]).unwrap();
    assert_eq!(
        reply.as_array().unwrap()[1],
        Reply::bulk_array(vec![Some(Bytes::from("a2")), Some(Bytes::from("b1"))])
    );

    assert_eq!(
        run(&table, &store, &["scan", "count", "match", "5"]),
        Err(CommandError::wrong_arity("scan"))
    );
}

#[test]
fn counters_and_expiry() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();

    assert_eq!(run(&table, &store, &["incrby", "n", "10"]), Ok(Reply::integer(10)));
    assert_eq!(run(&table, &store, &["decr", "n"]), Ok(Reply::integer(9)));
    assert_eq!(run(&table, &store, &["ttl", "n"]), Ok(Reply::integer(-1)));

    assert_eq!(run(&table, &store, &["expire", "n", "100"]), Ok(Reply::integer(1)));
    let ttl = run(&table, &store, &["ttl", "n"]).unwrap().as_integer().unwrap();
    assert!((99..=100).contains(&ttl), "{}", ttl);

    // INCR keeps the expiry
    run(&table, &store, &["incr", "n"]).unwrap();
    assert!(run(&table, &store, &["ttl", "n"]).unwrap().as_integer().unwrap() > 0);

    assert_eq!(run(&table, &store, &["persist", "n"]), Ok(Reply::integer(1)));
    assert_eq!(run(&table, &store, &["ttl", "n"]), Ok(Reply::integer(-1)));

    run(&table, &store, &["set", "s", "abc"]).unwrap();
    assert_eq!(
        run(&table, &store, &["incr", "s"]),
        Err(CommandError::Store(StoreError::NotInteger))
    );
    assert_eq!(
        run(&table, &store, &["expire", "s", "0"]),
        Err(CommandError::Store(StoreError::InvalidExpire))
    );
}

#[test]
fn custom_table_rejects_duplicates() {
    fn noop(_: &[Bytes], _: &dyn Store) -> Result<Reply, CommandError> {
        Ok(Reply::ok())
    }

    let mut table = CommandTable::new();
    table.register("noop", Arity::Exact(0), noop).unwrap();
    assert_eq!(
        table.register("NOOP", Arity::Exact(0), noop),
        Err(TableError::Duplicate("noop".to_string()))
    );

    let store = MemoryStore::new();
    assert_eq!(table.dispatch(b"NoOp", &[], &store), Ok(Reply::ok()));
    assert_eq!(
        table.dispatch(b"noop", &args(&["x"]), &store),
        Err(CommandError::wrong_arity("noop"))
    );
}

#[test]
fn wire_round_trip_for_mget() {
    let table = CommandTable::builtin().unwrap();
    let store = MemoryStore::new();
    run(&table, &store, &["set", "a", "1"]).unwrap();

    let (frame, _) = parse_command(b"*3\r\n$4\r\nMGET\r\n$1\r\na\r\n$1\r\nz\r\n")
        .unwrap()
        .unwrap();
    let result = table.dispatch(&frame.name, &frame.args, &store);
    assert_eq!(&encode(&result)[..], b"*2\r\n$1\r\n1\r\n$-1\r\n");
}
