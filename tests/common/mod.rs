#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copies fixtures into `dir` so a test can mutate or rescan them.
pub fn copy_fixtures(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let dest = dir.join(name);
            fs::copy(fixture(name), &dest).expect("copy fixture");
            dest
        })
        .collect()
}

/// Parses an audit log into (start, end, old, new) rows, header dropped.
pub fn read_log_rows(path: &Path) -> Vec<[String; 4]> {
    let text = fs::read_to_string(path).expect("read audit log");
    text.lines()
        .skip(1)
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 4, "bad log line: {line}");
            [0, 1, 2, 3].map(|i| fields[i].to_string())
        })
        .collect()
}
