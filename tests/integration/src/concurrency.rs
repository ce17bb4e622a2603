//! Integration tests for concurrent access to a shared store.

use std::sync::Arc;
use std::thread;

use ramdb_core::Engine;

const THREADS: usize = 8;
const OPS: usize = 500;

#[test]
fn concurrent_increments_are_not_lost() {
    let engine = Engine::in_memory();
    let store = Arc::clone(engine.store());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..OPS {
                    store.strings().incr_by("counter", 1);
                    store.hashes().hincrby("stats", "hits", 2);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = (THREADS * OPS) as i64;
    assert_eq!(store.strings().get("counter"), Some(total.to_string()));
    assert_eq!(
        store.hashes().hget("stats", "hits"),
        Some((total * 2).to_string())
    );
}

#[test]
fn concurrent_pushes_and_pops_balance() {
    let engine = Engine::in_memory();
    let store = Arc::clone(engine.store());

    let pushers: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..OPS {
                    store.lists().rpush("jobs", &[format!("{t}-{i}")]);
                }
            })
        })
        .collect();
    for h in pushers {
        h.join().unwrap();
    }
    assert_eq!(store.lists().llen("jobs"), THREADS * OPS);

    let poppers: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut taken = 0;
                while let Some(items) = store.lists().lpop("jobs", 3) {
                    taken += items.len();
                }
                taken
            })
        })
        .collect();
    let taken: usize = poppers.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(taken, THREADS * OPS);
    assert_eq!(store.lists().llen("jobs"), 0);
}

#[test]
fn per_thread_order_is_preserved() {
    let engine = Engine::in_memory();
    let store = Arc::clone(engine.store());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..OPS {
                    store.lists().rpush("log", &[format!("{t}:{i}")]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let items = store.lists().lrange("log", 0, -1);
    for t in 0..4 {
        let seq: Vec<usize> = items
            .iter()
            .filter_map(|item| item.strip_prefix(&format!("{t}:")))
            .map(|i| i.parse().unwrap())
            .collect();
        assert_eq!(seq, (0..OPS).collect::<Vec<_>>());
    }
}

#[test]
fn save_while_writing_produces_a_loadable_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(ramdb_integration::config_in(dir.path()));
    let store = Arc::clone(engine.store());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..2_000 {
                store.strings().set(&format!("k{i}"), i.to_string());
                store.lists().rpush("l", &[i.to_string()]);
            }
        })
    };
    for _ in 0..5 {
        assert!(engine.persistence().save(false));
    }
    writer.join().unwrap();

    assert!(engine.persistence().save(false));
    store.clear();
    assert!(engine.persistence().load_primary());
    assert_eq!(store.strings().len(), 2_000);
    assert_eq!(store.lists().llen("l"), 2_000);
}
