//! Test data loader helper.
//!
//! Resolves the fixture directories and schema documents under `tests/data`.

use std::path::{Path, PathBuf};

use live_fixtures_import::Record;
use live_fixtures_schema::StaticCatalog;
use serde_json::Value;

/// Directory holding the integration test data.
pub fn data_dir() -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

/// Fixture directory of the dog cafes scenario.
pub fn dog_cafes_root() -> PathBuf {
	data_dir().join("dog_cafes")
}

/// Schema catalog of the dog cafes scenario.
pub fn dog_cafes_catalog() -> StaticCatalog {
	StaticCatalog::from_path(data_dir().join("dog_cafes.toml")).unwrap()
}

/// Turns a `json!` object into a record.
pub fn record(value: Value) -> Record {
	value.as_object().cloned().unwrap()
}
