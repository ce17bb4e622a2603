//! Integration tests for snapshot save/load, backups and auto-backup.

use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use ramdb_core::{AutoBackup, Engine, EngineConfig};
use ramdb_persistence::format::write_i32;

use ramdb_integration::{config_in, TestEngine};

fn populate(engine: &Engine) {
    let store = engine.store();
    store.strings().set("greeting", "say \"hi\"");
    store.strings().set("empty", "");
    store.hashes().hset("user:1", "name", "ada");
    store.hashes().hset("user:1", "lang", "日本語");
    store.lists().rpush("queue", &["a".to_string(), "b".to_string()]);
    store.lists().rpush("empty-list", &["x".to_string()]);
    store.lists().lpop("empty-list", 1);
}

#[test]
fn snapshot_survives_restart() {
    let mut t = TestEngine::start();
    populate(&t.engine);
    assert!(t.engine.persistence().save(false));

    t.reopen();
    let store = t.engine.store();
    assert_eq!(store.strings().get("greeting"), Some("say \"hi\"".into()));
    assert_eq!(store.strings().get("empty"), Some(String::new()));
    assert_eq!(store.hashes().hget("user:1", "lang"), Some("日本語".into()));
    assert_eq!(store.lists().lrange("queue", 0, -1), vec!["a", "b"]);
    // empty collections are persisted too
    assert!(store.lists().contains_key("empty-list"));
    assert_eq!(store.key_count(), 5);
}

#[test]
fn close_writes_a_backup() {
    let mut t = TestEngine::start();
    populate(&t.engine);
    assert!(t.engine.close());

    assert!(t.path().join("data.rdb.gz").exists());
    assert_eq!(t.engine.persistence().list_backups().len(), 1);
}

#[test]
fn wrong_version_leaves_store_untouched() {
    let t = TestEngine::start();
    populate(&t.engine);

    let bogus = t.path().join("future.rdb.gz");
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    write_i32(&mut enc, 99).unwrap();
    enc.write_all(b"whatever follows").unwrap();
    fs::write(&bogus, enc.finish().unwrap()).unwrap();

    assert!(!t.engine.persistence().load(&bogus));
    assert_eq!(t.engine.store().key_count(), 5);
    assert_eq!(
        t.engine.store().strings().get("greeting"),
        Some("say \"hi\"".into())
    );
}

#[test]
fn truncated_file_leaves_store_untouched() {
    let t = TestEngine::start();
    populate(&t.engine);
    assert!(t.engine.persistence().save(false));

    let path = t.path().join("data.rdb.gz");
    let bytes = fs::read(&path).unwrap();
    let cut = t.path().join("cut.rdb.gz");
    fs::write(&cut, &bytes[..bytes.len() / 2]).unwrap();

    t.engine.store().strings().set("after", "save");
    assert!(!t.engine.persistence().load(&cut));
    assert_eq!(t.engine.store().strings().get("after"), Some("save".into()));
}

#[test]
fn missing_file_fails_closed() {
    let t = TestEngine::start();
    t.engine.store().strings().set("k", "v");
    assert!(!t.engine.persistence().load(&t.path().join("nope.rdb.gz")));
    assert_eq!(t.engine.store().strings().get("k"), Some("v".into()));
}

#[test]
fn load_replaces_current_contents() {
    let t = TestEngine::start();
    t.engine.store().strings().set("kept", "1");
    assert!(t.engine.persistence().save(false));

    t.engine.store().strings().set("dropped", "2");
    t.engine.store().strings().set("kept", "changed");
    assert!(t.engine.persistence().load_primary());

    assert_eq!(t.engine.store().strings().get("kept"), Some("1".into()));
    assert_eq!(t.engine.store().strings().get("dropped"), None);
}

#[test]
fn backups_are_listed_and_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let backups = dir.path().join("backups");
    fs::create_dir_all(&backups).unwrap();
    for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
        fs::write(backups.join(format!("data_{stamp}.rdb.gz")), b"x").unwrap();
        std::thread::sleep(Duration::from_millis(20));
    }
    fs::write(backups.join("notes.txt"), b"ignored").unwrap();

    let engine = Engine::open(EngineConfig {
        max_backups: 2,
        load_on_open: false,
        save_on_close: false,
        ..config_in(dir.path())
    });
    let persistence = engine.persistence();

    assert_eq!(
        persistence.list_backups(),
        vec![
            "data_20240103_000000.rdb.gz",
            "data_20240102_000000.rdb.gz",
            "data_20240101_000000.rdb.gz",
        ]
    );
    assert_eq!(persistence.prune_backups(), 1);
    assert_eq!(persistence.list_backups().len(), 2);
    assert!(!backups.join("data_20240101_000000.rdb.gz").exists());
    assert!(backups.join("notes.txt").exists());
}

#[test]
fn auto_backup_thread_writes_backups() {
    let t = TestEngine::start();
    t.engine.store().strings().set("k", "v");

    let persistence = Arc::clone(t.engine.persistence());
    let mut auto = AutoBackup::spawn(Arc::clone(&persistence), Duration::from_millis(50)).unwrap();
    std::thread::sleep(Duration::from_millis(400));
    auto.stop();

    assert!(t.path().join("data.rdb.gz").exists());
    assert!(!persistence.list_backups().is_empty());
}

#[test]
fn engine_starts_auto_backup_only_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut enabled = Engine::open(EngineConfig {
        auto_backup: true,
        backup_interval_minutes: 60,
        save_on_close: false,
        ..config_in(dir.path())
    });
    assert!(enabled.auto_backup_running());
    enabled.close();
    assert!(!enabled.auto_backup_running());

    let zero_interval = Engine::open(EngineConfig {
        auto_backup: true,
        backup_interval_minutes: 0,
        save_on_close: false,
        ..config_in(dir.path())
    });
    assert!(!zero_interval.auto_backup_running());
}
