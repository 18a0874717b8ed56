#![allow(missing_docs)]

use std::fs;

use epitrace::cli::import_export::{
    load_contacts, load_roots, write_paths_csv, write_trace_csv, ContactImportConfig,
};
use epitrace::{shortest_paths, trace_contacts};
use tempfile::TempDir;

fn fixture(dir: &TempDir) -> ContactImportConfig {
    let contacts = dir.path().join("movements.csv");
    fs::write(
        &contacts,
        "Source,Destination,T\nP1,P2,1\nP2,P3,4\nP3,P1,6\nP2,P3,2\n",
    )
    .expect("write contacts");
    ContactImportConfig::new(contacts)
}

#[test]
fn headers_match_case_insensitively() {
    let dir = TempDir::new().expect("tempdir");
    let set = load_contacts(&fixture(&dir)).expect("load");
    assert_eq!(set.table.len(), 4);
    assert_eq!(set.identifier_count(), 3);
    assert_eq!(set.table.source, vec![1, 2, 3, 2]);
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let err = load_contacts(&ContactImportConfig::new(dir.path().join("absent.csv")))
        .expect_err("missing file");
    assert!(err.to_string().starts_with("cannot open"));
}

#[test]
fn roots_with_separate_windows() {
    let dir = TempDir::new().expect("tempdir");
    let mut set = load_contacts(&fixture(&dir)).expect("load");
    let roots_path = dir.path().join("roots.csv");
    fs::write(
        &roots_path,
        "root,in_begin,in_end,out_begin,out_end\nP1,0,10,0,3\n",
    )
    .expect("write roots");
    let roots = load_roots(&roots_path, &mut set).expect("roots");
    assert_eq!(roots.root, vec![1]);
    assert_eq!(roots.out_end, vec![3]);

    let paths = shortest_paths(&set.table, &roots).expect("paths");
    // Outgoing window [0,3]: P1->P2 at 1, then P2->P3 at 2.
    assert_eq!(paths.out_node, vec![2, 3]);
    assert_eq!(paths.out_rowid, vec![1, 4]);
    // Ingoing window [0,10]: P3->P1 at 6, P2->P3 at 2 or 4, P1 already on path.
    assert_eq!(paths.in_node, vec![2, 3]);
    assert_eq!(paths.in_distance, vec![2, 1]);

    let mut buf = Vec::new();
    write_paths_csv(&mut buf, &set, &roots, &paths).expect("csv");
    let text = String::from_utf8(buf).expect("utf8");
    assert!(text.starts_with("direction,root,node,distance,rowid\n"));
    assert!(text.contains("out,P1,P3,2,4\n"));
}

#[test]
fn trace_csv_carries_contact_details() {
    let dir = TempDir::new().expect("tempdir");
    let mut set = load_contacts(&fixture(&dir)).expect("load");
    let roots_path = dir.path().join("roots.csv");
    fs::write(&roots_path, "root,t_begin,t_end\nP2,3,10\n").expect("write roots");
    let roots = load_roots(&roots_path, &mut set).expect("roots");

    let trace = trace_contacts(&set.table, &roots, 0).expect("trace");
    let mut buf = Vec::new();
    write_trace_csv(&mut buf, &set, &roots, &trace).expect("csv");
    let text = String::from_utf8(buf).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "direction,root,rowid,distance,source,destination,t",
            "out,P2,2,1,P2,P3,4",
            "out,P2,3,2,P3,P1,6",
        ]
    );
}
