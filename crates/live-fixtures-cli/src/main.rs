//! Live Fixtures CLI
//!
//! Imports a directory of fixture files into an existing database, in
//! dependency order, without touching the rows already there.
//!
//! ## Usage
//!
//! ```bash
//! live-fixtures import --schema schema.toml --root fixtures --database sqlite://app.db
//! live-fixtures import --settings fixtures.toml --dry-run -v
//! live-fixtures order --schema schema.toml --root fixtures
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use live_fixtures_import::prelude::*;
use live_fixtures_schema::{SchemaCatalog, StaticCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "live-fixtures")]
#[command(about = "Import fixtures into a live database", long_about = None)]
#[command(version, author)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Import every fixture file below the root directory
	Import {
		#[command(flatten)]
		source: SourceArgs,

		/// Database URL (sqlite://...); rows are only staged in memory when omitted
		#[arg(long, value_name = "URL")]
		database: Option<String>,

		/// Skip tables named in --order that have no fixture file
		#[arg(long)]
		skip_missing_tables: bool,

		/// Keep unresolved references as literal values instead of failing
		#[arg(long)]
		skip_missing_references: bool,

		/// Show a progress bar per table
		#[arg(long)]
		progress: bool,

		/// Run against an in-memory store and discard the result
		#[arg(long)]
		dry_run: bool,
	},

	/// Print the order in which tables would be imported
	Order {
		#[command(flatten)]
		source: SourceArgs,
	},
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
struct SourceArgs {
	/// Settings file (TOML); flags given on the command line win
	#[arg(long, value_name = "PATH")]
	settings: Option<PathBuf>,

	/// Directory holding the fixture files
	#[arg(long, value_name = "DIRECTORY")]
	root: Option<PathBuf>,

	/// Schema document (TOML or YAML)
	#[arg(long, value_name = "PATH")]
	schema: Option<PathBuf>,

	/// Explicit table order, comma separated
	#[arg(long, value_name = "TABLES", value_delimiter = ',')]
	order: Option<Vec<String>>,

	/// Map a table to an entity (can be repeated)
	/// Format: table=Entity
	#[arg(long = "class-name", value_name = "TABLE=ENTITY", value_parser = parse_class_name)]
	class_names: Vec<(String, String)>,
}

impl SourceArgs {
	/// Settings file contents overlaid with the command line.
	fn settings(&self) -> anyhow::Result<ImportSettings> {
		let mut settings = match &self.settings {
			Some(path) => ImportSettings::from_path(path)
				.with_context(|| format!("Failed to load settings from {}", path.display()))?,
			None => ImportSettings::default(),
		};

		if let Some(root) = &self.root {
			settings.root = root.clone();
		}
		if let Some(schema) = &self.schema {
			settings.schema = Some(schema.clone());
		}
		if let Some(order) = &self.order {
			settings.insert_order = Some(order.clone());
		}
		settings
			.class_names
			.extend(self.class_names.iter().cloned());

		if settings.root.as_os_str().is_empty() {
			settings.root = PathBuf::from(".");
		}
		Ok(settings)
	}
}

fn parse_class_name(value: &str) -> Result<(String, String), String> {
	match value.split_once('=') {
		Some((table, entity)) if !table.trim().is_empty() && !entity.trim().is_empty() => {
			Ok((table.trim().to_string(), entity.trim().to_string()))
		}
		_ => Err(format!("expected TABLE=ENTITY, got `{}`", value)),
	}
}

fn init_logging(verbosity: u8) {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbosity);

	let result = match cli.command {
		Commands::Import {
			source,
			database,
			skip_missing_tables,
			skip_missing_references,
			progress,
			dry_run,
		} => {
			run_import(
				source,
				database,
				ImportOptions::new()
					.with_skip_missing_tables(skip_missing_tables)
					.with_skip_missing_references(skip_missing_references)
					.with_show_progress(progress),
				dry_run,
				cli.verbosity,
			)
			.await
		}
		Commands::Order { source } => run_order(source).await,
	};

	if let Err(e) = result {
		eprintln!("Error: {:#}", e);
		process::exit(1);
	}
}

fn load_catalog(settings: &ImportSettings) -> anyhow::Result<Arc<dyn SchemaCatalog>> {
	let Some(path) = &settings.schema else {
		bail!("No schema given; pass --schema or set `schema` in the settings file");
	};
	let catalog = StaticCatalog::from_path(path)
		.with_context(|| format!("Failed to load schema from {}", path.display()))?;
	tracing::debug!(entities = catalog.len(), path = %path.display(), "Loaded schema");
	Ok(Arc::new(catalog))
}

/// Flags switch options on; they never switch off what the settings file enabled.
fn merge_options(settings: &ImportOptions, flags: ImportOptions) -> ImportOptions {
	ImportOptions::new()
		.with_skip_missing_tables(settings.skip_missing_tables || flags.skip_missing_tables)
		.with_skip_missing_references(
			settings.skip_missing_references || flags.skip_missing_references,
		)
		.with_show_progress(settings.show_progress || flags.show_progress)
}

async fn run_import(
	source: SourceArgs,
	database: Option<String>,
	flags: ImportOptions,
	dry_run: bool,
	verbosity: u8,
) -> anyhow::Result<()> {
	let settings = source.settings()?;
	let catalog = load_catalog(&settings)?;
	let options = merge_options(&settings.options, flags);
	let database = database.or_else(|| settings.database.clone());

	let command = ImportFixturesCommand::new().with_verbosity(verbosity);
	let mut importer = command.importer(ImportFixturesArgs::from(&settings), options, catalog)?;

	let report = match database {
		Some(url) if !dry_run => {
			let mut gateway = SqliteGateway::connect(&url)
				.await
				.with_context(|| format!("Failed to connect to {}", url))?;
			importer.import_all(&mut gateway).await?
		}
		_ => {
			let mut gateway = InMemoryGateway::new();
			let report = importer.import_all(&mut gateway).await?;
			println!("Dry run: no database was modified");
			report
		}
	};

	command.print_result(&report);
	Ok(())
}

async fn run_order(source: SourceArgs) -> anyhow::Result<()> {
	let settings = source.settings()?;
	let catalog = load_catalog(&settings)?;

	let mut importer = ImportFixturesCommand::new().importer(
		ImportFixturesArgs::from(&settings),
		settings.options,
		catalog,
	)?;
	for table in importer.prepare().await? {
		println!("{}", table);
	}
	Ok(())
}
