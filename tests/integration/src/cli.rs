//! Integration tests for the ramdb binary.

use ramdb_integration::{run_cli, run_cli_raw};

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// -- one-shot mode --

#[test]
fn oneshot_writes_persist_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.rdb.gz");

    let set = run_cli(&data, &["SET", "clikey", "clival"]);
    assert!(set.status.success(), "exit code: {:?}", set.status);
    assert!(stdout(&set).contains("OK"));
    assert!(data.exists());

    let get = run_cli(&data, &["GET", "clikey"]);
    assert!(get.status.success());
    assert!(
        stdout(&get).contains("\"clival\""),
        "expected clival in stdout, got: {}",
        stdout(&get)
    );
}

#[test]
fn oneshot_lists_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.rdb.gz");

    let push = run_cli(&data, &["LPUSH", "q", "a", "b", "c"]);
    assert!(stdout(&push).contains("(integer) 3"));

    let range = run_cli(&data, &["lrange", "q", "0", "-1"]);
    assert_eq!(stdout(&range).trim(), "1) \"c\"\n2) \"b\"\n3) \"a\"");
}

#[test]
fn oneshot_reads_do_not_create_files() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.rdb.gz");

    let get = run_cli(&data, &["GET", "missing"]);
    assert!(get.status.success());
    assert!(stdout(&get).contains("(not found)"));
    assert!(!data.exists());
    assert!(!dir.path().join("backups").exists());
}

#[test]
fn oneshot_oversized_reply_prints_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.rdb.gz");

    run_cli(&data, &["RPUSH", "q", "aaaaaaaa", "bbbbbbbb", "cccccccc"]);
    let range = run_cli(&data, &["--buffer-size", "10", "LRANGE", "q", "0", "-1"]);
    assert!(range.status.success());
    let out = stdout(&range);
    assert!(out.contains("(chunk 1/"), "expected chunk output, got: {out}");
    assert!(out.contains("_lrange"));
}

#[test]
fn oneshot_validation_error_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.rdb.gz");

    let output = run_cli(&data, &["LPOP", "q", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(error)"), "stderr: {stderr}");

    let unknown = run_cli(&data, &["NOTAREALCOMMAND"]);
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("unknown command"));
}

// -- config --

#[test]
fn config_template_is_valid_toml() {
    let output = run_cli_raw(&["--config-template"]);
    assert!(output.status.success());
    let template = stdout(&output);
    assert!(template.contains("buffer_size = 20480"));
    assert!(ramdb_core::EngineConfig::from_toml(&template).is_ok());
}

#[test]
fn config_file_sets_data_path() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("from-config.rdb.gz");
    let config = dir.path().join("ramdb.toml");
    std::fs::write(
        &config,
        format!("data_path = {:?}\nsave_on_close = false\n", data.display().to_string()),
    )
    .unwrap();
    let config = config.to_str().unwrap();

    let set = run_cli_raw(&["-c", config, "SET", "k", "v"]);
    assert!(set.status.success());
    assert!(data.exists());

    let get = run_cli_raw(&["--config", config, "GET", "k"]);
    assert!(stdout(&get).contains("\"v\""));
}
