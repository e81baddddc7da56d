//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// Path of the fixture schema checked into `tests/data`.
pub fn fixture_schema() -> PathBuf {
    manifest_dir().join("tests/data/generic_schema.json")
}

/// Scratch directory holding a copy of the fixture schema.
pub struct Workspace {
    pub dir: TempDir,
    pub schema: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let schema = dir.path().join("schema.json");
        std::fs::copy(fixture_schema(), &schema).expect("copy fixture schema");
        Self { dir, schema }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_json(&self, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, value.to_string()).expect("write json fixture");
        path
    }
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).expect("read json output");
    serde_json::from_str(&text).expect("parse json output")
}

/// Run the `emodcfg` binary from `cwd`.
pub fn run_emodcfg(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_emodcfg"))
        .current_dir(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run emodcfg")
}
