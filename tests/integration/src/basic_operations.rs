//! Integration tests for keyspace operations through the engine.

use ramdb_core::{Engine, InsertPosition};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn set_get_and_missing() {
    let engine = Engine::in_memory();
    let store = engine.store();

    store.strings().set("foo", "bar");
    store.strings().set("empty", "");
    assert_eq!(store.strings().get("foo"), Some("bar".into()));
    assert_eq!(store.strings().get("empty"), Some(String::new()));
    assert_eq!(store.strings().get("missing"), None);
}

#[test]
fn increments_treat_garbage_as_zero() {
    let engine = Engine::in_memory();
    let s = engine.store().strings();

    s.set("n", "not a number");
    assert_eq!(s.incr_by("n", 5), 5);
    assert_eq!(s.incr_by("n", -7), -2);
    assert_eq!(s.get("n"), Some("-2".into()));
    assert_eq!(s.incr_by_float("f", 0.5), "0.5");
    assert_eq!(s.incr_by_float("f", 2.0), "2.5");
}

#[test]
fn hash_lifecycle() {
    let engine = Engine::in_memory();
    let h = engine.store().hashes();

    assert!(h.hset("user", "name", "ada"));
    assert!(!h.hset("user", "name", "grace"));
    let pairs = vec![("age".to_string(), "36".to_string()), ("name".to_string(), "ada".to_string())];
    assert_eq!(h.hmset("user", &pairs), 1);
    assert_eq!(h.hget("user", "name"), Some("ada".into()));
    assert_eq!(h.hlen("user"), 2);
    assert_eq!(h.hincrby("user", "age", 1), 37);

    let mut keys = h.hkeys("user");
    keys.sort();
    assert_eq!(keys, vec!["age", "name"]);

    // hgetall hands out a copy
    let mut all = h.hgetall("user");
    all.insert("intruder".into(), "x".into());
    assert_eq!(h.hlen("user"), 2);

    assert_eq!(h.hdel("user", &strings(&["age", "name", "nope"])), 2);
    assert_eq!(h.hlen("user"), 0);
    // an emptied hash still exists
    assert_eq!(engine.store().exists(&["user"]), 1);
}

#[test]
fn lpush_reverses_batch_order() {
    let engine = Engine::in_memory();
    let l = engine.store().lists();

    assert_eq!(l.lpush("q", &strings(&["a", "b", "c"])), 3);
    assert_eq!(l.lrange("q", 0, -1), vec!["c", "b", "a"]);

    assert_eq!(l.rpush("q", &strings(&["x", "y"])), 5);
    assert_eq!(l.lrange("q", 0, -1), vec!["c", "b", "a", "x", "y"]);
}

#[test]
fn pops_report_removal_order() {
    let engine = Engine::in_memory();
    let l = engine.store().lists();
    l.rpush("q", &strings(&["1", "2", "3", "4"]));

    assert_eq!(l.lpop("q", 2), Some(strings(&["1", "2"])));
    assert_eq!(l.rpop("q", 5), Some(strings(&["4", "3"])));
    assert_eq!(l.lpop("q", 1), None);
    assert_eq!(l.rpop("missing", 1), None);
}

#[test]
fn lrem_directions() {
    let engine = Engine::in_memory();
    let l = engine.store().lists();
    let seed = strings(&["a", "b", "a", "c", "a"]);

    l.rpush("head", &seed);
    assert_eq!(l.lrem("head", 2, "a"), 2);
    assert_eq!(l.lrange("head", 0, -1), vec!["b", "c", "a"]);

    l.rpush("tail", &seed);
    assert_eq!(l.lrem("tail", -2, "a"), 2);
    assert_eq!(l.lrange("tail", 0, -1), vec!["a", "b", "c"]);

    l.rpush("all", &seed);
    assert_eq!(l.lrem("all", 0, "a"), 3);
    assert_eq!(l.lrange("all", 0, -1), vec!["b", "c"]);
}

#[test]
fn ltrim_keeps_range_or_clears() {
    let engine = Engine::in_memory();
    let l = engine.store().lists();
    l.rpush("q", &strings(&["a", "b", "c", "d", "e"]));

    assert!(l.ltrim("q", 1, -2));
    assert_eq!(l.lrange("q", 0, -1), vec!["b", "c", "d"]);

    assert!(l.ltrim("q", 2, 1));
    assert_eq!(l.llen("q"), 0);
    assert!(!l.ltrim("missing", 0, 1));
}

#[test]
fn linsert_sentinels() {
    let engine = Engine::in_memory();
    let l = engine.store().lists();
    l.rpush("q", &strings(&["a", "c"]));

    assert_eq!(l.linsert("q", InsertPosition::After, "a", "b"), 3);
    assert_eq!(l.linsert("q", InsertPosition::Before, "a", "_"), 4);
    assert_eq!(l.lrange("q", 0, -1), vec!["_", "a", "b", "c"]);
    assert_eq!(l.linsert("q", InsertPosition::Before, "zzz", "x"), -1);
    assert_eq!(l.linsert("missing", InsertPosition::Before, "a", "x"), 0);
}

#[test]
fn index_access() {
    let engine = Engine::in_memory();
    let l = engine.store().lists();
    l.rpush("q", &strings(&["a", "b", "c"]));

    assert_eq!(l.lindex("q", -1), Some("c".into()));
    assert_eq!(l.lindex("q", 3), None);
    assert!(l.lset("q", -3, "A"));
    assert!(!l.lset("q", 3, "x"));
    assert_eq!(l.lrange("q", -100, 100), vec!["A", "b", "c"]);
}

#[test]
fn registry_counts_every_keyspace() {
    let engine = Engine::in_memory();
    let store = engine.store();

    store.strings().set("shared", "v");
    store.hashes().hset("shared", "f", "v");
    store.lists().rpush("shared", &strings(&["v"]));
    store.strings().set("solo", "v");

    assert_eq!(store.exists(&["shared", "solo", "none"]), 4);
    assert_eq!(store.key_count(), 4);
    assert_eq!(store.del(&["shared"]), 3);
    assert_eq!(store.exists(&["shared"]), 0);
    assert_eq!(store.key_count(), 1);
}
