//! Import options and the settings file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};

/// Tolerance and display switches for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
	/// Skip explicit-order entries that have no fixture file.
	pub skip_missing_tables: bool,

	/// Keep an unresolvable reference as a literal value instead of failing.
	pub skip_missing_references: bool,

	/// Draw a progress bar per table.
	pub show_progress: bool,
}

impl ImportOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets skip missing tables flag.
	pub fn with_skip_missing_tables(mut self, skip: bool) -> Self {
		self.skip_missing_tables = skip;
		self
	}

	/// Sets skip missing references flag.
	pub fn with_skip_missing_references(mut self, skip: bool) -> Self {
		self.skip_missing_references = skip;
		self
	}

	/// Sets show progress flag.
	pub fn with_show_progress(mut self, show: bool) -> Self {
		self.show_progress = show;
		self
	}
}

/// Contents of an `import.toml` settings file.
///
/// ```toml
/// root = "fixtures"
/// schema = "schema.toml"
/// database = "sqlite://app.db"
/// insert_order = ["authors", "books"]
///
/// [class_names]
/// writers = "Author"
///
/// [options]
/// skip_missing_references = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
	/// Directory holding the fixture files.
	pub root: PathBuf,

	/// Schema catalog document.
	pub schema: Option<PathBuf>,

	/// Database URL.
	pub database: Option<String>,

	/// Explicit table order; computed when absent.
	pub insert_order: Option<Vec<String>>,

	/// Table name to entity name.
	pub class_names: HashMap<String, String>,

	pub options: ImportOptions,
}

impl ImportSettings {
	/// Parses settings from TOML text.
	pub fn from_toml_str(source: &str) -> ImportResult<Self> {
		toml::from_str(source).map_err(|e| ImportError::Parse {
			path: "<settings>".to_string(),
			message: e.to_string(),
		})
	}

	/// Loads a settings file; relative `root` and `schema` paths are taken
	/// relative to the file's directory.
	pub fn from_path(path: impl AsRef<Path>) -> ImportResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)?;
		let mut settings: Self = toml::from_str(&source).map_err(|e| ImportError::Parse {
			path: path.display().to_string(),
			message: e.to_string(),
		})?;

		let base = path.parent().unwrap_or_else(|| Path::new(""));
		if settings.root.is_relative() {
			settings.root = base.join(&settings.root);
		}
		if let Some(schema) = settings.schema.as_mut()
			&& schema.is_relative()
		{
			*schema = base.join(&*schema);
		}
		Ok(settings)
	}
}
