//! import command implementation.
//!
//! This command imports a directory of fixtures into the database without
//! truncating existing rows.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use live_fixtures_schema::SchemaCatalog;

use crate::error::{ImportError, ImportResult};
use crate::gateway::DbGateway;
use crate::importer::{FixtureImporter, ImportReport};
use crate::options::{ImportOptions, ImportSettings};
use crate::source::FixtureDirectory;

/// Arguments for the import command.
#[derive(Debug, Clone, Default)]
pub struct ImportFixturesArgs {
	/// Directory holding the fixture files.
	pub root: PathBuf,

	/// Explicit table order; computed when absent.
	pub insert_order: Option<Vec<String>>,

	/// Table name to entity name.
	pub class_names: HashMap<String, String>,
}

impl From<&ImportSettings> for ImportFixturesArgs {
	fn from(settings: &ImportSettings) -> Self {
		Self {
			root: settings.root.clone(),
			insert_order: settings.insert_order.clone(),
			class_names: settings.class_names.clone(),
		}
	}
}

/// The import command for loading a fixture directory into the database.
///
/// # Example
///
/// ```ignore
/// let command = ImportFixturesCommand::new().with_verbosity(1);
/// let args = ImportFixturesArgs {
///     root: PathBuf::from("fixtures"),
///     ..Default::default()
/// };
/// let report = command
///     .execute(args, ImportOptions::new(), catalog, &mut gateway)
///     .await?;
/// println!("Imported {} rows", report.total_rows());
/// ```
#[derive(Debug, Default)]
pub struct ImportFixturesCommand {
	verbosity: u8,
}

impl ImportFixturesCommand {
	/// Creates a new import command.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets verbosity level.
	pub fn with_verbosity(mut self, level: u8) -> Self {
		self.verbosity = level;
		self
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"import"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Imports a directory of fixtures, resolving labels to database-assigned keys"
	}

	/// Builds the importer the command would run.
	pub fn importer(
		&self,
		args: ImportFixturesArgs,
		options: ImportOptions,
		catalog: Arc<dyn SchemaCatalog>,
	) -> ImportResult<FixtureImporter> {
		if !args.root.is_dir() {
			return Err(ImportError::Configuration(format!(
				"Fixture directory {} does not exist",
				args.root.display()
			)));
		}

		let mut importer =
			FixtureImporter::from_parts(Box::new(FixtureDirectory::new(&args.root)), catalog)
				.with_class_names(args.class_names)
				.with_options(options);
		if let Some(order) = args.insert_order {
			importer = importer.with_insert_order(order);
		}
		Ok(importer)
	}

	/// Executes the import command.
	///
	/// # Arguments
	///
	/// * `args` - Fixture root, order and class names
	/// * `options` - Tolerance and progress switches
	/// * `catalog` - Schema the fixtures are interpreted against
	/// * `gateway` - Database the rows are written to
	///
	/// # Returns
	///
	/// Returns the report of the committed import.
	pub async fn execute(
		&self,
		args: ImportFixturesArgs,
		options: ImportOptions,
		catalog: Arc<dyn SchemaCatalog>,
		gateway: &mut dyn DbGateway,
	) -> ImportResult<ImportReport> {
		let mut importer = self.importer(args, options, catalog)?;
		let report = importer.import_all(gateway).await?;

		if self.verbosity > 0 {
			self.print_result(&report);
		}

		Ok(report)
	}

	/// Prints the import report summary.
	pub fn print_result(&self, report: &ImportReport) {
		println!(
			"Imported {} row(s) from {} table(s)",
			report.total_rows(),
			report.tables.len()
		);

		for table in &report.tables {
			if table.overridden {
				println!("  {:<24} custom import", table.table);
			} else if table.join_rows > 0 {
				println!(
					"  {:<24} {} row(s), {} join row(s)",
					table.table, table.rows, table.join_rows
				);
			} else {
				println!("  {:<24} {} row(s)", table.table, table.rows);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gateway::InMemoryGateway;
	use live_fixtures_schema::{Association, EntityType, StaticCatalog};
	use rstest::rstest;
	use std::fs;
	use tempfile::TempDir;

	fn catalog() -> Arc<dyn SchemaCatalog> {
		Arc::new(
			StaticCatalog::builder()
				.entity(EntityType::new("Author", "authors"))
				.entity(
					EntityType::new("Book", "books")
						.with_association(Association::belongs_to("author", "Author")),
				)
				.build()
				.unwrap(),
		)
	}

	#[rstest]
	fn test_command_metadata() {
		let command = ImportFixturesCommand::new();
		assert_eq!(command.name(), "import");
		assert!(!command.description().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_execute_imports_directory() {
		// Arrange
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("authors.yml"), "tolkien:\n  name: Tolkien\n").unwrap();
		fs::write(
			dir.path().join("books.yml"),
			"hobbit:\n  title: The Hobbit\n  author: tolkien\n",
		)
		.unwrap();
		let args = ImportFixturesArgs {
			root: dir.path().to_path_buf(),
			..Default::default()
		};
		let mut gateway = InMemoryGateway::new();

		// Act
		let report = ImportFixturesCommand::new()
			.execute(args, ImportOptions::new(), catalog(), &mut gateway)
			.await
			.unwrap();

		// Assert
		assert_eq!(report.order, vec!["authors", "books"]);
		assert_eq!(report.total_rows(), 2);
		assert_eq!(gateway.rows("books")[0]["author_id"], serde_json::json!(1));
	}

	#[rstest]
	#[tokio::test]
	async fn test_execute_rejects_missing_root() {
		let args = ImportFixturesArgs {
			root: PathBuf::from("/no/such/fixtures"),
			..Default::default()
		};
		let mut gateway = InMemoryGateway::new();

		let result = ImportFixturesCommand::new()
			.execute(args, ImportOptions::new(), catalog(), &mut gateway)
			.await;

		assert!(matches!(result, Err(ImportError::Configuration(_))));
	}

	#[rstest]
	fn test_args_from_settings() {
		let settings = ImportSettings {
			root: PathBuf::from("fixtures"),
			insert_order: Some(vec!["authors".to_string()]),
			..Default::default()
		};

		let args = ImportFixturesArgs::from(&settings);

		assert_eq!(args.root, PathBuf::from("fixtures"));
		assert_eq!(args.insert_order, Some(vec!["authors".to_string()]));
	}
}
