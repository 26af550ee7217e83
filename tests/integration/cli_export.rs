#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;

fn setup_db(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.db"));
    seed_people(&path).expect("seed people");
    (dir, path)
}

fn seed_people(path: &Path) -> rusqlite::Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE people (id INTEGER, name TEXT, note TEXT);
         INSERT INTO people VALUES (1, 'Ann', 'Hi' || char(9) || 'there');
         INSERT INTO people VALUES (2, 'B\"ob', NULL);
         CREATE TABLE files (id INTEGER, payload BINARY);",
    )
}

const QUERY: &str = "SELECT id, name, note FROM people ORDER BY id";

fn sqlcsv(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sqlcsv");
    cmd.env("SQLCSV_CONFIG", dir.path().join("no-config.toml"))
        .env_remove("SQLCSV_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn writes_csv_to_stdout() {
    let (dir, db_path) = setup_db("stdout");
    let output = sqlcsv(&dir)
        .arg(&db_path)
        .args(["--headers", "-q", QUERY, "-o", "-"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        String::from_utf8(output).expect("utf8 output"),
        "\"id\",\"name\",\"note\"\r\n\"1\",\"Ann\",\"Hi there\"\r\n\"2\",\"B\"\"ob\",\"\"\r\n"
    );
}

#[test]
fn writes_csv_file_and_reports_summary() {
    let (dir, db_path) = setup_db("file");
    let out = dir.path().join("people.csv");
    let output = sqlcsv(&dir)
        .arg(&db_path)
        .args(["-q", QUERY, "--lf", "--delimiter", ";", "-o"])
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf8 output");
    assert!(stdout.contains("Exported 2 rows (3 columns"), "{stdout}");
    assert_eq!(
        fs::read_to_string(&out).expect("read output"),
        "\"1\";\"Ann\";\"Hi there\"\n\"2\";\"B\"\"ob\";\"\"\n"
    );
}

#[test]
fn reads_query_from_input_file() {
    let (dir, db_path) = setup_db("input");
    let query_file = dir.path().join("query.sql");
    fs::write(&query_file, "SELECT name FROM people WHERE id = 1\n").expect("write query");
    let output = sqlcsv(&dir)
        .arg(&db_path)
        .arg("-i")
        .arg(&query_file)
        .args(["-o", "-"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(output, b"\"Ann\"\r\n");
}

#[test]
fn summary_emits_json() {
    let (dir, db_path) = setup_db("json");
    let out = dir.path().join("people.csv");
    let output = sqlcsv(&dir)
        .args(["--format", "json", "-q", QUERY, "-o"])
        .arg(&out)
        .arg(&db_path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["rows"].as_u64(), Some(2));
    assert_eq!(json["columns"][1]["name"].as_str(), Some("name"));
    assert_eq!(json["columns"][0]["kind"].as_str(), Some("numeric"));
    assert!(json["flush_error"].is_null());
}

#[test]
fn binary_column_fails_with_schema_error() {
    let (dir, db_path) = setup_db("binary");
    let out = dir.path().join("files.csv");
    let output = sqlcsv(&dir)
        .arg(&db_path)
        .args(["--headers", "-q", "SELECT id, payload FROM files", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(
        stderr.contains("error: column \"payload\" (#2) has type BINARY which is not supported"),
        "{stderr}"
    );
    assert_eq!(fs::read(&out).expect("read output").len(), 0);
}

#[test]
fn query_and_input_are_mutually_exclusive() {
    let (dir, db_path) = setup_db("exclusive");
    let query_file = dir.path().join("query.sql");
    fs::write(&query_file, QUERY).expect("write query");
    sqlcsv(&dir)
        .arg(&db_path)
        .args(["-q", QUERY, "-o", "-", "-i"])
        .arg(&query_file)
        .assert()
        .failure()
        .code(2);
    sqlcsv(&dir)
        .arg(&db_path)
        .args(["-o", "-"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn write_statements_are_refused() {
    let (dir, db_path) = setup_db("readonly");
    sqlcsv(&dir)
        .arg(&db_path)
        .args(["-q", "DELETE FROM people", "-o", "-"])
        .assert()
        .failure()
        .code(1);
    let conn = Connection::open(&db_path).expect("reopen");
    let count: i64 = conn
        .query_row("SELECT count(*) FROM people", [], |row| row.get(0))
        .expect("count rows");
    assert_eq!(count, 2);
}

#[test]
fn profile_supplies_database_and_format() {
    let (dir, db_path) = setup_db("profile");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[export]\nheaders = true\n\n[profiles.local]\ndatabase = {:?}\nlf = true\ndelimiter = \"|\"\n",
            db_path.display().to_string()
        ),
    )
    .expect("write config");
    let output = sqlcsv(&dir)
        .env("SQLCSV_CONFIG", &config)
        .args(["--profile", "local", "-q", "SELECT id, name FROM people", "-o", "-"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        String::from_utf8(output).expect("utf8 output"),
        "\"id\"|\"name\"\n\"1\"|\"Ann\"\n\"2\"|\"B\"\"ob\"\n"
    );
}

#[test]
fn rejects_multi_byte_delimiter() {
    let (dir, db_path) = setup_db("delimiter");
    let output = sqlcsv(&dir)
        .arg(&db_path)
        .args(["-q", QUERY, "-o", "-", "--delimiter", "::"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(
        stderr.contains("delimiter must be a single ASCII character"),
        "{stderr}"
    );
}

#[test]
fn flags_switch_off_profile_line_ending_and_headers() {
    let (dir, db_path) = setup_db("override");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[profiles.local]\ndatabase = {:?}\nlf = true\nheaders = true\n",
            db_path.display().to_string()
        ),
    )
    .expect("write config");
    let output = sqlcsv(&dir)
        .env("SQLCSV_CONFIG", &config)
        .args(["--profile", "local", "--crlf", "--no-headers"])
        .args(["-q", "SELECT id FROM people ORDER BY id", "-o", "-"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(output, b"\"1\"\r\n\"2\"\r\n");
}

#[test]
fn numeric_quoting_refuses_number_delimiters() {
    let (dir, db_path) = setup_db("numeric");
    let out = dir.path().join("people.csv");
    let output = sqlcsv(&dir)
        .arg(&db_path)
        .args(["-q", QUERY, "--quote", "non-numeric", "--delimiter", ".", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(
        stderr.contains("error: delimiter '.' cannot be used with non-numeric quoting"),
        "{stderr}"
    );
    assert!(!out.exists());
}
