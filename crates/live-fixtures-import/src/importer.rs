//! Import orchestrator.
//!
//! [`FixtureImporter`] loads the record sets, settles on one insertion order
//! and then imports every table inside a single transaction. Rows are pulled
//! from the [`RowTransformer`] one at a time; each inserted row's key is
//! recorded in the [`LabelMap`] before the next row is produced.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use live_fixtures_schema::{EntityType, SchemaCatalog};

use crate::error::{ImportError, ImportResult};
use crate::gateway::DbGateway;
use crate::label::{LabelMap, PrimaryKey};
use crate::options::ImportOptions;
use crate::order::compute_insert_order;
use crate::polymorphic::PolymorphicInferencer;
use crate::progress::{ProgressBarSink, ProgressEvent, ProgressSink, TracingProgress};
use crate::record::RecordSet;
use crate::source::{FixtureDirectory, RecordSetSource};
use crate::transform::RowTransformer;

/// Where an import run stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
	Idle,
	/// The insertion order is being computed, or has been computed and no
	/// transaction was opened yet.
	Ordering,
	/// Rows of this entity are being inserted.
	Importing(String),
	Committed,
	RolledBack,
}

/// Custom import step that replaces the default path for one table.
///
/// The step runs inside the import transaction through the same gateway.
/// Labels it returns are recorded in the label map.
#[async_trait]
pub trait TableOverride: Send + Sync {
	async fn run(
		&self,
		gateway: &mut dyn DbGateway,
		labels: &LabelMap,
	) -> ImportResult<Vec<(String, PrimaryKey)>>;
}

#[async_trait]
impl<F> TableOverride for F
where
	F: Fn(&LabelMap) -> ImportResult<()> + Send + Sync,
{
	async fn run(
		&self,
		_gateway: &mut dyn DbGateway,
		labels: &LabelMap,
	) -> ImportResult<Vec<(String, PrimaryKey)>> {
		self(labels)?;
		Ok(Vec::new())
	}
}

/// Outcome of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
	pub table: String,
	pub entity: Option<String>,
	/// Primary rows inserted.
	pub rows: usize,
	/// Join rows inserted.
	pub join_rows: usize,
	/// Whether a registered override handled the table.
	pub overridden: bool,
}

/// Outcome of a committed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
	/// Tables in the order they were imported.
	pub order: Vec<String>,
	pub tables: Vec<TableReport>,
	pub labels: LabelMap,
}

impl ImportReport {
	/// Primary and join rows inserted across all tables.
	pub fn total_rows(&self) -> usize {
		self.tables
			.iter()
			.map(|table| table.rows + table.join_rows)
			.sum()
	}
}

#[derive(Debug, Clone)]
struct PlannedTable {
	table: String,
	entity: Option<String>,
	records: Option<RecordSet>,
}

/// Imports a directory (or any [`RecordSetSource`]) of fixtures.
///
/// # Example
///
/// ```
/// use live_fixtures_import::{FixtureImporter, MemorySource, RecordSet};
/// use live_fixtures_import::gateway::InMemoryGateway;
/// use live_fixtures_schema::{Association, EntityType, StaticCatalog};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let catalog = StaticCatalog::builder()
///     .entity(EntityType::new("Author", "authors"))
///     .entity(
///         EntityType::new("Book", "books")
///             .with_association(Association::belongs_to("author", "Author")),
///     )
///     .build()
///     .unwrap();
/// let source = MemorySource::new()
///     .with_table("books", RecordSet::from_value(json!({ "hobbit": { "author": "tolkien" } })).unwrap())
///     .with_table("authors", RecordSet::from_value(json!({ "tolkien": { "name": "Tolkien" } })).unwrap());
///
/// let mut importer = FixtureImporter::from_source(source, catalog);
/// let mut gateway = InMemoryGateway::new();
/// let report = importer.import_all(&mut gateway).await.unwrap();
///
/// assert_eq!(report.order, vec!["authors", "books"]);
/// assert_eq!(gateway.rows("books")[0]["author_id"], json!(1));
/// # });
/// ```
pub struct FixtureImporter {
	source: Box<dyn RecordSetSource>,
	catalog: Arc<dyn SchemaCatalog>,
	insert_order: Option<Vec<String>>,
	class_names: HashMap<String, String>,
	options: ImportOptions,
	overrides: HashMap<String, Arc<dyn TableOverride>>,
	progress: Option<Box<dyn ProgressSink>>,
	state: ImportState,
	plan: Option<Vec<PlannedTable>>,
	order: Option<Vec<String>>,
	labels: LabelMap,
}

impl FixtureImporter {
	/// Importer reading fixture files below `root`.
	pub fn new<C>(root: impl AsRef<Path>, catalog: C) -> Self
	where
		C: SchemaCatalog + 'static,
	{
		Self::from_source(FixtureDirectory::new(root), catalog)
	}

	/// Importer reading record sets from `source`.
	pub fn from_source<S, C>(source: S, catalog: C) -> Self
	where
		S: RecordSetSource + 'static,
		C: SchemaCatalog + 'static,
	{
		Self::from_parts(Box::new(source), Arc::new(catalog))
	}

	/// Importer over already boxed collaborators.
	pub fn from_parts(source: Box<dyn RecordSetSource>, catalog: Arc<dyn SchemaCatalog>) -> Self {
		Self {
			source,
			catalog,
			insert_order: None,
			class_names: HashMap::new(),
			options: ImportOptions::default(),
			overrides: HashMap::new(),
			progress: None,
			state: ImportState::Idle,
			plan: None,
			order: None,
			labels: LabelMap::new(),
		}
	}

	/// Imports exactly these tables, in this order, instead of computing one.
	pub fn with_insert_order<I, S>(mut self, tables: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.insert_order = Some(tables.into_iter().map(Into::into).collect());
		self
	}

	/// Maps `table` to the entity called `entity`.
	pub fn with_class_name(mut self, table: impl Into<String>, entity: impl Into<String>) -> Self {
		self.class_names.insert(table.into(), entity.into());
		self
	}

	/// Adds several table to entity mappings.
	pub fn with_class_names(mut self, class_names: HashMap<String, String>) -> Self {
		self.class_names.extend(class_names);
		self
	}

	pub fn with_options(mut self, options: ImportOptions) -> Self {
		self.options = options;
		self
	}

	/// Replaces the default progress sink.
	pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
		self.progress = Some(Box::new(progress));
		self
	}

	/// Registers a custom import step for `table`.
	pub fn override_table(
		&mut self,
		table: impl Into<String>,
		procedure: impl TableOverride + 'static,
	) -> &mut Self {
		self.overrides.insert(table.into(), Arc::new(procedure));
		self.plan = None;
		self.order = None;
		self
	}

	pub fn options(&self) -> &ImportOptions {
		&self.options
	}

	pub fn state(&self) -> &ImportState {
		&self.state
	}

	/// The order that was, or will be, used; `None` until computed.
	pub fn insert_order(&self) -> Option<&[String]> {
		self.order.as_deref()
	}

	/// Labels recorded so far.
	pub fn label_map(&self) -> &LabelMap {
		&self.labels
	}

	/// Loads the record sets and settles on the insertion order.
	///
	/// Called by [`import_all`](Self::import_all) when needed.
	pub async fn prepare(&mut self) -> ImportResult<&[String]> {
		if self.plan.is_none() {
			self.state = ImportState::Ordering;
			let plan = match self.build_plan().await {
				Ok(plan) => plan,
				Err(e) => {
					self.state = ImportState::Idle;
					return Err(e);
				}
			};
			self.order = Some(plan.iter().map(|step| step.table.clone()).collect());
			self.plan = Some(plan);
		}
		Ok(self.order.as_deref().unwrap_or_default())
	}

	/// Imports every table inside one transaction.
	///
	/// On any error the transaction is rolled back and the importer ends in
	/// [`ImportState::RolledBack`].
	pub async fn import_all(&mut self, gateway: &mut dyn DbGateway) -> ImportResult<ImportReport> {
		if matches!(self.state, ImportState::Committed | ImportState::RolledBack) {
			return Err(ImportError::Configuration(
				"This importer has already run; create a new one to import again".to_string(),
			));
		}

		if let Err(e) = self.prepare().await {
			self.state = ImportState::RolledBack;
			return Err(e);
		}
		let plan = self.plan.take().unwrap_or_default();

		tracing::info!(tables = plan.len(), "Starting fixture import");
		if let Err(e) = gateway.begin_transaction().await {
			self.state = ImportState::RolledBack;
			return Err(e.into());
		}

		let mut progress: Box<dyn ProgressSink> = match self.progress.take() {
			Some(progress) => progress,
			None if self.options.show_progress => Box::new(ProgressBarSink::new()),
			None => Box::new(TracingProgress),
		};
		let result = self.run_plan(&plan, gateway, &mut *progress).await;
		self.progress = Some(progress);

		let tables = match result {
			Ok(tables) => tables,
			Err(e) => {
				if let Err(rollback_error) = gateway.rollback().await {
					tracing::warn!(error = %rollback_error, "Rollback failed");
				}
				self.state = ImportState::RolledBack;
				tracing::warn!(error = %e, "Fixture import rolled back");
				return Err(e);
			}
		};

		if let Err(e) = gateway.commit().await {
			self.state = ImportState::RolledBack;
			return Err(e.into());
		}
		self.state = ImportState::Committed;

		let report = ImportReport {
			order: plan.into_iter().map(|step| step.table).collect(),
			tables,
			labels: self.labels.clone(),
		};
		tracing::info!(rows = report.total_rows(), "Fixture import committed");
		Ok(report)
	}

	async fn run_plan(
		&mut self,
		plan: &[PlannedTable],
		gateway: &mut dyn DbGateway,
		progress: &mut dyn ProgressSink,
	) -> ImportResult<Vec<TableReport>> {
		let catalog = Arc::clone(&self.catalog);
		let mut reports = Vec::with_capacity(plan.len());

		for step in plan {
			let name = step.entity.clone().unwrap_or_else(|| step.table.clone());
			self.state = ImportState::Importing(name.clone());

			if let Some(procedure) = self.overrides.get(&step.table).cloned() {
				tracing::debug!(table = %step.table, "Running import override");
				for (label, key) in procedure.run(gateway, &self.labels).await? {
					self.labels.record(label, key)?;
				}
				reports.push(TableReport {
					table: step.table.clone(),
					entity: step.entity.clone(),
					rows: 0,
					join_rows: 0,
					overridden: true,
				});
				continue;
			}

			let (Some(entity_name), Some(records)) = (&step.entity, &step.records) else {
				continue;
			};
			let entity = catalog.entity(entity_name).ok_or_else(|| {
				ImportError::Configuration(format!("Unknown entity {}", entity_name))
			})?;

			let mut producer = RowTransformer::new(catalog.as_ref(), entity, &step.table, records)
				.with_skip_missing_references(self.options.skip_missing_references)
				.rows();
			let total = producer.primary_total();
			let mut report = TableReport {
				table: step.table.clone(),
				entity: Some(entity.name().to_string()),
				rows: 0,
				join_rows: 0,
				overridden: false,
			};
			progress.on_start(entity.name(), total);

			while let Some(row) = producer.next_row(&self.labels) {
				let row = row?;
				let key = gateway
					.insert(&row.table, &row.values)
					.await
					.map_err(|source| ImportError::Insertion {
						table: row.table.clone(),
						label: row.label.clone(),
						source,
					})?;

				match row.label {
					Some(label) => {
						self.labels.record(label, key)?;
						report.rows += 1;
						progress.on_progress(&ProgressEvent {
							entity: entity.name().to_string(),
							processed: report.rows,
							total,
						});
					}
					None => report.join_rows += 1,
				}
			}

			progress.on_finish(entity.name(), report.rows);
			reports.push(report);
		}

		Ok(reports)
	}

	async fn build_plan(&self) -> ImportResult<Vec<PlannedTable>> {
		let available: BTreeSet<String> = self.source.list_tables().await?.into_iter().collect();

		let plan = match &self.insert_order {
			Some(order) => self.plan_explicit(order, &available).await?,
			None => self.plan_computed(&available).await?,
		};

		let mut owners: HashMap<&str, &str> = HashMap::new();
		for step in &plan {
			if let Some(entity) = &step.entity
				&& let Some(other) = owners.insert(entity.as_str(), step.table.as_str())
			{
				return Err(ImportError::Configuration(format!(
					"Tables {} and {} both map to entity {}",
					other, step.table, entity
				)));
			}
		}
		Ok(plan)
	}

	async fn plan_explicit(
		&self,
		order: &[String],
		available: &BTreeSet<String>,
	) -> ImportResult<Vec<PlannedTable>> {
		let mut plan = Vec::with_capacity(order.len());
		let mut seen = BTreeSet::new();
		let mut missing = Vec::new();

		for table in order {
			if !seen.insert(table.as_str()) {
				return Err(ImportError::Configuration(format!(
					"Table {} appears more than once in insert_order",
					table
				)));
			}

			if self.overrides.contains_key(table) {
				let entity = self.entity_for(table, None).ok().map(|e| e.name().to_string());
				plan.push(PlannedTable {
					table: table.clone(),
					entity,
					records: None,
				});
				continue;
			}

			if !available.contains(table) {
				if self.options.skip_missing_tables {
					tracing::warn!(table = %table, "No fixtures for table in insert_order; skipped");
				} else {
					missing.push(table.clone());
				}
				continue;
			}

			let records = self.load(table).await?;
			let entity = self.entity_for(table, Some(&records))?.name().to_string();
			plan.push(PlannedTable {
				table: table.clone(),
				entity: Some(entity),
				records: Some(records),
			});
		}

		if !missing.is_empty() {
			return Err(ImportError::Configuration(format!(
				"table(s) mentioned in `insert_order` which has no fixture file to import: {}",
				missing.join(", ")
			)));
		}

		for table in available.iter().filter(|table| !seen.contains(table.as_str())) {
			tracing::warn!(table = %table, "Fixtures not listed in insert_order; skipped");
		}

		Ok(plan)
	}

	async fn plan_computed(&self, available: &BTreeSet<String>) -> ImportResult<Vec<PlannedTable>> {
		let mut tables: BTreeMap<String, PlannedTable> = BTreeMap::new();

		for table in available {
			let records = self.load(table).await?;
			let entity = self.entity_for(table, Some(&records))?.name().to_string();
			let step = PlannedTable {
				table: table.clone(),
				entity: Some(entity.clone()),
				records: Some(records),
			};
			if let Some(previous) = tables.insert(entity.clone(), step) {
				return Err(ImportError::Configuration(format!(
					"Tables {} and {} both map to entity {}",
					previous.table, table, entity
				)));
			}
		}

		for table in self.overrides.keys().filter(|table| !available.contains(*table)) {
			let entity = self.entity_for(table, None)?.name().to_string();
			if let Some(existing) = tables.get(&entity) {
				return Err(ImportError::Configuration(format!(
					"Tables {} and {} both map to entity {}",
					existing.table, table, entity
				)));
			}
			tables.insert(
				entity.clone(),
				PlannedTable {
					table: table.clone(),
					entity: Some(entity),
					records: None,
				},
			);
		}

		let mut entities: Vec<&EntityType> = Vec::with_capacity(tables.len());
		for name in tables.keys() {
			let entity = self.catalog.entity(name).ok_or_else(|| {
				ImportError::Configuration(format!("Unknown entity {}", name))
			})?;
			entities.push(entity);
		}

		let with_records = entities.iter().filter_map(|entity| {
			tables
				.get(entity.name())
				.and_then(|step| step.records.as_ref())
				.map(|records| (*entity, records))
		});
		let discovered = PolymorphicInferencer::new(self.catalog.as_ref()).infer(with_records);
		tracing::debug!(?discovered, "Inferred polymorphic dependencies");

		let order = compute_insert_order(
			self.catalog.as_ref(),
			entities.iter().copied(),
			&discovered,
		)?;
		Ok(order
			.into_iter()
			.filter_map(|entity| tables.remove(&entity))
			.collect())
	}

	async fn load(&self, table: &str) -> ImportResult<RecordSet> {
		self.source.load(table).await?.ok_or_else(|| {
			ImportError::Configuration(format!("Fixtures for table {} disappeared", table))
		})
	}

	/// Explicit class name, then the file's `_fixture.model_class`, then
	/// the catalog's table lookup.
	fn entity_for(&self, table: &str, records: Option<&RecordSet>) -> ImportResult<&EntityType> {
		let declared = self
			.class_names
			.get(table)
			.map(String::as_str)
			.or_else(|| records.and_then(RecordSet::model_class));

		match declared {
			Some(name) => self.catalog.entity(name).ok_or_else(|| {
				ImportError::Configuration(format!(
					"Table {} maps to entity {}, which the schema does not define",
					table, name
				))
			}),
			None => self.catalog.entity_type_for(table).ok_or_else(|| {
				ImportError::Configuration(format!("No entity is defined for table {}", table))
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::GatewayError;
	use crate::gateway::InMemoryGateway;
	use crate::source::MemorySource;
	use live_fixtures_schema::{Association, StaticCatalog};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn importer() -> FixtureImporter {
		let catalog = StaticCatalog::builder()
			.entity(EntityType::new("Owner", "owners"))
			.entity(
				EntityType::new("Pet", "pets")
					.with_association(Association::belongs_to("owner", "Owner")),
			)
			.build()
			.unwrap();
		let source = MemorySource::new()
			.with_table(
				"pets",
				RecordSet::from_value(json!({ "rex": { "owner": "alice" } })).unwrap(),
			)
			.with_table(
				"owners",
				RecordSet::from_value(json!({ "alice": { "name": "Alice" } })).unwrap(),
			);
		FixtureImporter::from_source(source, catalog)
	}

	#[rstest]
	#[tokio::test]
	async fn test_state_moves_from_idle_to_committed(mut importer: FixtureImporter) {
		assert_eq!(importer.state(), &ImportState::Idle);
		assert!(importer.insert_order().is_none());

		importer.prepare().await.unwrap();
		assert_eq!(importer.state(), &ImportState::Ordering);
		assert_eq!(importer.insert_order().unwrap(), ["owners", "pets"]);

		let mut gateway = InMemoryGateway::new();
		importer.import_all(&mut gateway).await.unwrap();
		assert_eq!(importer.state(), &ImportState::Committed);
		assert_eq!(importer.label_map().len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_begin_rolls_back(mut importer: FixtureImporter) {
		// Arrange
		let mut gateway = InMemoryGateway::new();
		gateway.begin_transaction().await.unwrap();

		// Act
		let error = importer.import_all(&mut gateway).await.unwrap_err();

		// Assert
		assert!(matches!(
			error,
			ImportError::Gateway(GatewayError::TransactionActive)
		));
		assert_eq!(importer.state(), &ImportState::RolledBack);
		assert!(importer.label_map().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_registering_override_discards_computed_order(mut importer: FixtureImporter) {
		importer.prepare().await.unwrap();

		importer.override_table("owners", |_: &LabelMap| -> ImportResult<()> { Ok(()) });

		assert!(importer.insert_order().is_none());
	}

	struct Adopt;

	#[async_trait]
	impl TableOverride for Adopt {
		async fn run(
			&self,
			gateway: &mut dyn DbGateway,
			labels: &LabelMap,
		) -> ImportResult<Vec<(String, PrimaryKey)>> {
			assert!(labels.is_empty());
			let row = json!({ "name": "Alice" }).as_object().cloned().unwrap();
			let key = gateway.insert("owners", &row).await?;
			Ok(vec![("alice".to_string(), key)])
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_override_labels_are_recorded(mut importer: FixtureImporter) {
		// Arrange
		importer.override_table("owners", Adopt);
		let mut gateway = InMemoryGateway::new().with_next_id("owners", 7);

		// Act
		let report = importer.import_all(&mut gateway).await.unwrap();

		// Assert
		assert_eq!(report.order, vec!["owners", "pets"]);
		assert!(report.tables[0].overridden);
		assert_eq!(report.tables[0].rows, 0);
		assert_eq!(gateway.rows("pets")[0]["owner_id"], json!(7));
	}

	#[rstest]
	#[tokio::test]
	async fn test_table_listed_twice_is_rejected(importer: FixtureImporter) {
		let mut importer = importer.with_insert_order(["owners", "pets", "owners"]);

		let error = importer.prepare().await.unwrap_err();

		assert!(matches!(error, ImportError::Configuration(ref message) if message.contains("more than once")));
		assert_eq!(importer.state(), &ImportState::Idle);
	}

	#[rstest]
	#[tokio::test]
	async fn test_two_tables_for_one_entity_are_rejected(importer: FixtureImporter) {
		let mut importer = importer
			.with_class_name("pets", "Owner")
			.with_insert_order(["owners", "pets"]);

		let error = importer.prepare().await.unwrap_err();

		assert!(matches!(error, ImportError::Configuration(ref message) if message.contains("both map to entity Owner")));
	}
}
