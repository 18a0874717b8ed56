#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use csv::ReaderBuilder;
use serde_json::Value;
use tempfile::TempDir;

const CONTACTS: &str = "\
source,destination,t
farm-a,farm-b,10
farm-b,farm-c,20
farm-a,farm-b,12
farm-d,farm-a,5
";

struct Workspace {
    dir: TempDir,
    contacts: PathBuf,
    config: PathBuf,
}

impl Workspace {
    fn new(contacts: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("contacts.csv");
        fs::write(&path, contacts).expect("write contacts");
        let config = dir.path().join("config").join("cli.toml");
        Self {
            dir,
            contacts: path,
            config,
        }
    }

    fn file(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).expect("write file");
        path
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("epitrace");
        cmd.env("EPITRACE_CONFIG", &self.config)
            .env_remove("RUST_LOG");
        cmd
    }
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("valid json")
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = ReaderBuilder::new().from_path(path).expect("open csv");
    reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn summary_emits_json() {
    let ws = Workspace::new(CONTACTS);
    let output = ws
        .cmd()
        .args(["--format", "json", "summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["inDegree"][0], 1);
    assert_eq!(json["outDegree"][0], 1);
    assert_eq!(json["ingoingContactChain"][0], 1);
    assert_eq!(json["outgoingContactChain"][0], 2);
}

#[test]
fn paths_write_csv_file() {
    let ws = Workspace::new(CONTACTS);
    let out = ws.dir.path().join("paths.csv");
    ws.cmd()
        .args(["--format", "csv", "--output"])
        .arg(&out)
        .args(["paths", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success();
    let rows = read_csv(&out);
    assert_eq!(
        rows,
        vec![
            vec!["in", "farm-a", "farm-d", "1", "4"],
            vec!["out", "farm-a", "farm-b", "1", "1"],
            vec!["out", "farm-a", "farm-c", "2", "2"],
        ]
    );
}

#[test]
fn trace_reads_roots_file_with_dates() {
    let ws = Workspace::new(
        "src,dst,day\nA,B,2024-03-01\nB,C,2024-03-05\nB,C,2024-03-09\nC,D,2024-03-07\n",
    );
    let roots = ws.file(
        "roots.csv",
        "root,t_begin,t_end\nA,2024-02-01,2024-03-31\nD,2024-03-01,2024-03-06\n",
    );
    let output = ws
        .cmd()
        .args(["--format", "json", "trace", "--contacts"])
        .arg(&ws.contacts)
        .arg("--roots")
        .arg(&roots)
        .args([
            "--source-column",
            "src",
            "--destination-column",
            "dst",
            "--time-column",
            "day",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = stdout_json(&output);
    let groups = json["groups"].as_array().expect("groups");
    assert_eq!(groups.len(), 2);
    // A: A->B, both B->C contacts, then C->D only after the 03-05 contact.
    assert_eq!(groups[0]["outRowid"], serde_json::json!([1, 2, 3, 4]));
    assert_eq!(groups[0]["outDistance"], serde_json::json!([1, 2, 2, 3]));
    // D's window ends before C->D happens.
    assert_eq!(groups[1]["inRowid"], serde_json::json!([]));
}

#[test]
fn trace_respects_max_distance() {
    let ws = Workspace::new(CONTACTS);
    let out = ws.dir.path().join("trace.csv");
    ws.cmd()
        .args(["--format", "csv", "--output"])
        .arg(&out)
        .args(["trace", "--max-distance", "1", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success();
    let rows = read_csv(&out);
    let out_rows: Vec<&Vec<String>> = rows.iter().filter(|r| r[0] == "out").collect();
    assert_eq!(out_rows.len(), 2);
    assert!(out_rows.iter().all(|r| r[3] == "1" && r[5] == "farm-b"));
}

#[test]
fn text_output_lists_nodes() {
    let ws = Workspace::new(CONTACTS);
    let output = ws
        .cmd()
        .args(["--theme", "plain", "paths", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-b", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("Shortest paths"));
    assert!(text.contains("farm-c"));
}

#[test]
fn unknown_column_fails() {
    let ws = Workspace::new(CONTACTS);
    let output = ws
        .cmd()
        .args(["summary", "--time-column", "date", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "1"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.contains("column 'date' not found"));
}

#[test]
fn missing_window_fails() {
    let ws = Workspace::new(CONTACTS);
    let output = ws
        .cmd()
        .args(["summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.contains("--in-end"));
}

#[test]
fn output_requires_machine_format() {
    let ws = Workspace::new(CONTACTS);
    ws.cmd()
        .arg("--output")
        .arg(ws.dir.path().join("x.txt"))
        .args(["summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "1"])
        .assert()
        .failure();
}

#[test]
fn config_columns_are_persisted_and_used() {
    let ws = Workspace::new("from,to,when\nx,y,1\ny,z,2\n");
    ws.cmd()
        .args([
            "config",
            "set-columns",
            "--source",
            "from",
            "--destination",
            "to",
            "--time",
            "when",
        ])
        .assert()
        .success();
    let saved = fs::read_to_string(&ws.config).expect("config written");
    assert!(saved.contains("source = \"from\""));

    let output = ws
        .cmd()
        .args(["--format", "json", "summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "x", "--t-begin", "0", "--t-end", "10"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(stdout_json(&output)["outgoingContactChain"][0], 2);
}

#[test]
fn config_output_default_applies() {
    let ws = Workspace::new(CONTACTS);
    ws.cmd()
        .args(["config", "set-output", "--default-format", "json"])
        .assert()
        .success();
    let output = ws
        .cmd()
        .args(["summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-c", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(stdout_json(&output)["ingoingContactChain"][0], 3);
}

#[test]
fn stats_go_to_stderr_for_json() {
    let ws = Workspace::new(CONTACTS);
    let assert = ws
        .cmd()
        .args(["--format", "json", "--stats", "summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success();
    let output = assert.get_output();
    stdout_json(&output.stdout);
    let stderr = String::from_utf8(output.stderr.clone()).expect("utf8");
    assert!(stderr.contains("\"events_indexed\":4"));
}

#[test]
fn config_show_prints_location_and_toml() {
    let ws = Workspace::new(CONTACTS);
    ws.cmd()
        .args(["config", "set-columns", "--time", "day"])
        .assert()
        .success();
    let output = ws
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some(format!("# {}", ws.config.display()).as_str())
    );
    let body: String = lines.collect::<Vec<_>>().join("\n");
    let parsed: toml::Value = toml::from_str(&body).expect("valid toml");
    assert_eq!(parsed["columns"]["time"].as_str(), Some("day"));
    assert_eq!(parsed["columns"]["source"].as_str(), Some("source"));
}

#[test]
fn text_stats_split_counters_by_direction() {
    let ws = Workspace::new(CONTACTS);
    let output = ws
        .cmd()
        .args(["--theme", "plain", "--stats", "summary", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-a", "--t-begin", "0", "--t-end", "100"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("Network summary (1 row)"));
    assert!(text.contains("Traversal stats"));
    let header = text
        .lines()
        .find(|line| line.starts_with("counter"))
        .expect("stats header");
    assert!(header.contains("ingoing") && header.contains("outgoing"));
    let indexed = text
        .lines()
        .find(|line| line.starts_with("events indexed"))
        .expect("events row");
    assert!(indexed.ends_with(" 4"));
}

#[test]
fn empty_paths_print_a_notice() {
    let ws = Workspace::new(CONTACTS);
    let output = ws
        .cmd()
        .args(["paths", "--contacts"])
        .arg(&ws.contacts)
        .args(["--root", "farm-d", "--t-begin", "0", "--t-end", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert_eq!(text.trim(), "no reachable nodes");
}
