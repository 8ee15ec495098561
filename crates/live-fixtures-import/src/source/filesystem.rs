//! Filesystem-based record set source.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::RecordSetSource;
use crate::error::{ImportError, ImportResult};
use crate::record::RecordSet;

const EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Record set source reading fixture files below a root directory.
///
/// Every `*.yml`, `*.yaml` and `*.json` file is one table. The table name is
/// the path relative to the root without its extension, with directory
/// separators replaced by `_`, so `admin/users.yml` holds `admin_users`.
pub struct FixtureDirectory {
	root: PathBuf,
}

impl FixtureDirectory {
	/// Create a new FixtureDirectory
	///
	/// # Example
	///
	/// ```rust,no_run
	/// use live_fixtures_import::source::FixtureDirectory;
	/// let source = FixtureDirectory::new("./fixtures");
	/// ```
	pub fn new<P: AsRef<Path>>(root: P) -> Self {
		Self {
			root: root.as_ref().to_path_buf(),
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Maps each table name to the file holding it.
	fn discover(&self) -> ImportResult<BTreeMap<String, PathBuf>> {
		let mut files = BTreeMap::new();
		if !self.root.is_dir() {
			return Err(ImportError::Configuration(format!(
				"Fixture directory {} does not exist",
				self.root.display()
			)));
		}

		for entry in walkdir::WalkDir::new(&self.root)
			.follow_links(true)
			.sort_by_file_name()
			.into_iter()
			.filter_map(|e| e.ok())
		{
			let path = entry.path();
			if !entry.file_type().is_file() {
				continue;
			}
			let has_fixture_extension = path
				.extension()
				.and_then(|ext| ext.to_str())
				.is_some_and(|ext| EXTENSIONS.contains(&ext));
			if !has_fixture_extension {
				continue;
			}
			let Ok(relative) = path.strip_prefix(&self.root) else {
				continue;
			};
			let table = table_name_for_path(relative);
			if let Some(previous) = files.insert(table.clone(), path.to_path_buf()) {
				return Err(ImportError::Configuration(format!(
					"Table {} is defined by both {} and {}",
					table,
					previous.display(),
					path.display()
				)));
			}
		}
		Ok(files)
	}

	fn parse(&self, path: &Path) -> ImportResult<RecordSet> {
		let content = std::fs::read_to_string(path)?;
		let parse_error = |message: String| ImportError::Parse {
			path: path.display().to_string(),
			message,
		};

		let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
			Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
			#[cfg(feature = "yaml")]
			_ => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
			#[cfg(not(feature = "yaml"))]
			_ => {
				return Err(parse_error(
					"YAML fixtures require the yaml feature".to_string(),
				));
			}
		};

		RecordSet::from_value(value).map_err(parse_error)
	}
}

/// Table name for a fixture file path relative to the fixture root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use live_fixtures_import::source::table_name_for_path;
///
/// assert_eq!(table_name_for_path(Path::new("books.yml")), "books");
/// assert_eq!(table_name_for_path(Path::new("admin/users.yml")), "admin_users");
/// ```
pub fn table_name_for_path(relative: &Path) -> String {
	let stem = relative.with_extension("");
	stem.components()
		.filter_map(|c| match c {
			Component::Normal(s) => s.to_str(),
			_ => None,
		})
		.collect::<Vec<_>>()
		.join("_")
}

#[async_trait]
impl RecordSetSource for FixtureDirectory {
	async fn list_tables(&self) -> ImportResult<Vec<String>> {
		Ok(self.discover()?.into_keys().collect())
	}

	async fn load(&self, table: &str) -> ImportResult<Option<RecordSet>> {
		let files = self.discover()?;
		let Some(path) = files.get(table) else {
			return Ok(None);
		};
		tracing::debug!(table, path = %path.display(), "Loading fixture file");
		self.parse(path).map(Some)
	}
}
