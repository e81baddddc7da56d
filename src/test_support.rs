//! Fixtures shared by unit tests.
use crate::schema::SchemaDocument;
use std::path::{Path, PathBuf};

pub(crate) const GENERIC_SCHEMA: &str = include_str!("../tests/data/generic_schema.json");

pub(crate) fn generic_schema() -> SchemaDocument {
    SchemaDocument::from_json_str(GENERIC_SCHEMA).expect("fixture schema parses")
}

/// Write the fixture schema into `dir` and return its path.
pub(crate) fn write_generic_schema(dir: &Path) -> PathBuf {
    let path = dir.join("schema.json");
    std::fs::write(&path, GENERIC_SCHEMA).expect("write fixture schema");
    path
}
