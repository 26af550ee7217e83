#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;
use sqlcsv::cli::{run_query_export, CliError, OutputTarget, QueryExportConfig};
use sqlcsv::cursor::SqliteCursor;
use sqlcsv::export::{
    ColumnKind, ExportConfig, ExportSession, LineEnding, NoProgress, Progress, QuoteMode, RunStats,
};
use sqlcsv::ExportError;
use tempfile::TempDir;

fn setup_db(name: &str, schema: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.db"));
    let conn = Connection::open(&path).expect("create database");
    conn.execute_batch(schema).expect("seed database");
    (dir, path)
}

fn people_db() -> (TempDir, PathBuf) {
    setup_db(
        "people",
        "CREATE TABLE people (id INTEGER, name TEXT, note TEXT, score REAL);
         INSERT INTO people VALUES (1, 'Ann', 'Hi' || char(9) || 'there', 1.5);
         INSERT INTO people VALUES (2, 'B\"ob', NULL, NULL);",
    )
}

fn export_to_file(
    db_path: PathBuf,
    dir: &TempDir,
    query: &str,
    export: ExportConfig,
) -> (Result<sqlcsv::ExportSummary, CliError>, PathBuf) {
    let out = dir.path().join("out.csv");
    let cfg = QueryExportConfig {
        db_path,
        query: query.to_string(),
        output: OutputTarget::File(out.clone()),
        export,
    };
    (run_query_export(&cfg, &mut NoProgress), out)
}

#[test]
fn exports_people_with_header() {
    let (dir, db_path) = people_db();
    let (result, out) = export_to_file(
        db_path,
        &dir,
        "SELECT id, name, note FROM people ORDER BY id",
        ExportConfig::default().headers(true),
    );
    let summary = result.expect("export succeeds");
    assert_eq!(summary.rows, 2);
    let kinds: Vec<ColumnKind> = summary.columns.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        [ColumnKind::Numeric, ColumnKind::Text, ColumnKind::Text]
    );
    assert_eq!(
        fs::read_to_string(out).expect("read output"),
        "\"id\",\"name\",\"note\"\r\n\"1\",\"Ann\",\"Hi there\"\r\n\"2\",\"B\"\"ob\",\"\"\r\n"
    );
}

#[test]
fn blob_column_is_rejected_before_any_row() {
    let (dir, db_path) = setup_db(
        "files",
        "CREATE TABLE files (id INTEGER, payload BLOB);
         INSERT INTO files VALUES (1, X'00FF');",
    );
    let (result, out) = export_to_file(
        db_path,
        &dir,
        "SELECT id, payload FROM files",
        ExportConfig::default().headers(true),
    );
    match result {
        Err(CliError::Export(ExportError::UnsupportedColumn {
            ordinal, name, ..
        })) => {
            assert_eq!(ordinal, 1);
            assert_eq!(name, "payload");
        }
        other => panic!("expected unsupported column, got {other:?}"),
    }
    assert_eq!(fs::read(out).expect("read output").len(), 0);
}

#[test]
fn expression_columns_export_as_text() {
    let (dir, db_path) = people_db();
    let (result, out) = export_to_file(
        db_path,
        &dir,
        "SELECT id * 2 AS doubled, upper(name), score FROM people WHERE id = 1",
        ExportConfig::default().line_ending(LineEnding::Lf),
    );
    let summary = result.expect("export succeeds");
    assert_eq!(summary.columns[0].name, "doubled");
    assert_eq!(summary.columns[0].type_name, "");
    assert_eq!(summary.columns[0].kind, ColumnKind::Text);
    assert_eq!(summary.columns[1].name, "upper(name)");
    assert_eq!(
        fs::read_to_string(out).expect("read output"),
        "\"2\",\"ANN\",\"1.5\"\n"
    );
}

#[test]
fn text_holding_raw_bytes_is_sanitized() {
    let (dir, db_path) = setup_db(
        "raw",
        "CREATE TABLE notes (body TEXT);
         INSERT INTO notes VALUES (CAST(X'41000A42' AS TEXT));
         INSERT INTO notes VALUES (X'43FF44');",
    );
    let (result, out) = export_to_file(
        db_path,
        &dir,
        "SELECT body FROM notes ORDER BY rowid",
        ExportConfig::default(),
    );
    result.expect("export succeeds");
    assert_eq!(
        fs::read_to_string(out).expect("read output"),
        "\"A  B\"\r\n\"CD\"\r\n"
    );
}

#[test]
fn non_numeric_quoting_with_tab_delimiter() {
    let (dir, db_path) = people_db();
    let (result, out) = export_to_file(
        db_path,
        &dir,
        "SELECT id, name FROM people ORDER BY id",
        ExportConfig::default()
            .delimiter(b'\t')
            .line_ending(LineEnding::Lf)
            .quote_mode(QuoteMode::NonNumeric),
    );
    result.expect("export succeeds");
    assert_eq!(
        fs::read_to_string(out).expect("read output"),
        "1\t\"Ann\"\n2\t\"B\"\"ob\"\n"
    );
}

#[test]
fn delimiter_inside_bare_numbers_is_refused_before_output() {
    let (dir, db_path) = people_db();
    let (result, out) = export_to_file(
        db_path,
        &dir,
        "SELECT score, name FROM people WHERE id = 1",
        ExportConfig::default()
            .delimiter(b'.')
            .quote_mode(QuoteMode::NonNumeric),
    );
    match result {
        Err(CliError::Export(ExportError::InvalidDelimiter { delimiter, .. })) => {
            assert_eq!(delimiter, '.');
        }
        other => panic!("expected invalid delimiter, got {other:?}"),
    }
    assert!(!out.exists());
}

#[derive(Default)]
struct Counter {
    notifications: u64,
    last: u64,
}

impl Progress for Counter {
    fn rows_written(&mut self, stats: &RunStats) {
        self.notifications += 1;
        self.last = stats.rows;
    }
}

#[test]
fn streams_large_results_through_a_small_buffer() {
    let (dir, db_path) = setup_db("empty", "CREATE TABLE unused (x INTEGER);");
    let conn = Connection::open(&db_path).expect("open database");
    let mut statement = conn
        .prepare(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 10000)
             SELECT x, 'row ' || x FROM c",
        )
        .expect("prepare");
    let cursor = SqliteCursor::open(&mut statement).expect("open cursor");

    let out = dir.path().join("large.csv");
    let file = fs::File::create(&out).expect("create output");
    let config = ExportConfig::default()
        .buffer_capacity(4096)
        .line_ending(LineEnding::Lf);
    let mut counter = Counter::default();
    let summary = ExportSession::new(cursor, file, config)
        .run(&mut counter)
        .expect("export succeeds");

    assert_eq!(summary.rows, 10_000);
    assert_eq!(counter.notifications, 200);
    assert_eq!(counter.last, 10_000);
    let text = fs::read_to_string(&out).expect("read output");
    assert_eq!(text.lines().count(), 10_000);
    assert_eq!(text.lines().last(), Some("\"10000\",\"row 10000\""));
    assert_eq!(summary.bytes_written, text.len() as u64);
}
