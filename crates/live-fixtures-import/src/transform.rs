//! Label-resolving row transformer.
//!
//! Turns one table's [`RecordSet`] into storage-ready [`TableRow`]s. Rows are
//! pulled one at a time with [`RowProducer::next_row`], which receives the
//! [`LabelMap`] as it stands at that moment. The caller inserts each row and
//! records its key before pulling the next one, so later rows (including the
//! join rows emitted after every primary row) can reference it.

use indexmap::IndexMap;
use live_fixtures_schema::{Association, AssociationKind, EntityType, SchemaCatalog};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ImportError, ImportResult};
use crate::label::LabelMap;
use crate::polymorphic::split_type_annotation;
use crate::record::{Record, RecordSet};

static LIST_SEPARATOR: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\s*,\s*").expect("Invalid list separator regex pattern"));

/// Whether a row came from a fixture record or was synthesized for a join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
	Primary,
	Join,
}

/// A row ready to be handed to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
	pub table: String,
	/// Label of the originating record; join rows have none.
	pub label: Option<String>,
	pub values: Record,
	pub kind: RowKind,
}

/// Catalog associations of `entity` plus the subtype overlay selected by the
/// record's discriminator column.
pub(crate) fn effective_associations<'a>(
	catalog: &'a dyn SchemaCatalog,
	entity: &'a EntityType,
	record: &Record,
) -> impl Iterator<Item = &'a Association> + use<'a> {
	let subtype = entity
		.inheritance_column()
		.and_then(|column| record.get(column))
		.and_then(Value::as_str);
	catalog
		.associations_of(entity)
		.iter()
		.chain(entity.subtype_associations(subtype).iter())
}

/// Join rows waiting for the primary rows of their record set, grouped by
/// join table in order of first use.
type PendingJoins = IndexMap<String, Vec<PendingJoin>>;

/// A join row waiting for the primary rows of its record set.
#[derive(Debug, Clone)]
struct PendingJoin {
	join_table: String,
	owner_label: String,
	owner_column: String,
	target_column: String,
	target: Value,
}

/// Per-table transformation settings.
pub struct RowTransformer<'a> {
	catalog: &'a dyn SchemaCatalog,
	entity: &'a EntityType,
	table: &'a str,
	records: &'a RecordSet,
	skip_missing_references: bool,
}

impl<'a> RowTransformer<'a> {
	pub fn new(
		catalog: &'a dyn SchemaCatalog,
		entity: &'a EntityType,
		table: &'a str,
		records: &'a RecordSet,
	) -> Self {
		Self {
			catalog,
			entity,
			table,
			records,
			skip_missing_references: false,
		}
	}

	/// Keep unresolvable references as literal values.
	pub fn with_skip_missing_references(mut self, skip: bool) -> Self {
		self.skip_missing_references = skip;
		self
	}

	/// Starts producing rows.
	pub fn rows(self) -> RowProducer<'a> {
		RowProducer {
			transformer: self,
			position: 0,
			pending: PendingJoins::new(),
			joins: None,
			join_position: 0,
			finished: false,
		}
	}

	fn primary_row(
		&self,
		label: &str,
		record: &Record,
		labels: &LabelMap,
		pending: &mut PendingJoins,
	) -> ImportResult<TableRow> {
		let mut values = record.clone();

		for association in effective_associations(self.catalog, self.entity, record) {
			match association.kind() {
				AssociationKind::BelongsTo | AssociationKind::PolymorphicBelongsTo => {
					self.rewrite_belongs_to(association, &mut values, labels)?;
				}
				AssociationKind::ManyToMany => {
					self.collect_joins(association, label, &mut values, pending);
				}
				_ => {}
			}
		}

		Ok(TableRow {
			table: self.table.to_string(),
			label: Some(label.to_string()),
			values,
			kind: RowKind::Primary,
		})
	}

	fn rewrite_belongs_to(
		&self,
		association: &Association,
		values: &mut Record,
		labels: &LabelMap,
	) -> ImportResult<()> {
		let foreign_key = association.foreign_key();
		if association.name() == foreign_key || !values.contains_key(association.name()) {
			return Ok(());
		}
		let Some(mut value) = values.shift_remove(association.name()) else {
			return Ok(());
		};

		if association.kind().is_polymorphic()
			&& let Value::String(raw) = &value
			&& let Some((label, type_name)) = split_type_annotation(raw)
		{
			values.insert(
				association.foreign_type().into_owned(),
				Value::String(type_name.to_string()),
			);
			value = Value::String(label.to_string());
		}

		let resolved = self.resolve(value, labels)?;
		values.insert(foreign_key.into_owned(), resolved);
		Ok(())
	}

	fn collect_joins(
		&self,
		association: &Association,
		owner_label: &str,
		values: &mut Record,
		pending: &mut PendingJoins,
	) {
		let Some(value) = values.shift_remove(association.name()) else {
			return;
		};
		let (Some(join_table), Some(target_column)) = (
			association.join_table(),
			association.association_foreign_key(),
		) else {
			tracing::warn!(
				entity = self.entity.name(),
				association = association.name(),
				"Many-to-many association has no join table; values dropped"
			);
			return;
		};

		let group = pending.entry(join_table.to_string()).or_default();
		for target in target_labels(value) {
			group.push(PendingJoin {
				join_table: join_table.to_string(),
				owner_label: owner_label.to_string(),
				owner_column: association.foreign_key().into_owned(),
				target_column: target_column.to_string(),
				target,
			});
		}
	}

	fn join_row(&self, join: &PendingJoin, labels: &LabelMap) -> ImportResult<TableRow> {
		let owner = self.resolve(Value::String(join.owner_label.clone()), labels)?;
		let target = self.resolve(join.target.clone(), labels)?;

		let mut values = Record::new();
		values.insert(join.owner_column.clone(), owner);
		values.insert(join.target_column.clone(), target);

		Ok(TableRow {
			table: join.join_table.clone(),
			label: None,
			values,
			kind: RowKind::Join,
		})
	}

	/// Resolves a reference value to a key.
	///
	/// A value naming a known label becomes that label's key. Null stays null
	/// and integers are taken as literal keys. Anything else is a missing
	/// reference, kept verbatim when missing references are tolerated.
	fn resolve(&self, value: Value, labels: &LabelMap) -> ImportResult<Value> {
		let label = match &value {
			Value::Null => return Ok(Value::Null),
			Value::String(label) => label.clone(),
			other => other.to_string(),
		};
		if let Some(key) = labels.get(&label) {
			return Ok(Value::from(key));
		}
		if value.is_i64() || value.is_u64() {
			return Ok(value);
		}

		if self.skip_missing_references {
			tracing::warn!(
				label = %label,
				entity = self.entity.name(),
				table = self.table,
				"Unresolved reference kept as a literal value"
			);
			Ok(value)
		} else {
			Err(ImportError::MissingReference {
				label,
				entity: self.entity.name().to_string(),
				table: self.table.to_string(),
			})
		}
	}
}

/// Target labels of a many-to-many value: a list, or one comma separated string.
fn target_labels(value: Value) -> Vec<Value> {
	match value {
		Value::Null => Vec::new(),
		Value::Array(items) => items.into_iter().filter(|item| !item.is_null()).collect(),
		Value::String(list) => {
			let list = list.trim();
			if list.is_empty() {
				return Vec::new();
			}
			LIST_SEPARATOR
				.split(list)
				.map(|label| Value::String(label.to_string()))
				.collect()
		}
		other => vec![other],
	}
}

/// Pull-based row sequence for one record set.
///
/// Yields one primary row per record in file order, then the join rows of
/// the whole set, one join table after another. Stops after the first error.
pub struct RowProducer<'a> {
	transformer: RowTransformer<'a>,
	position: usize,
	pending: PendingJoins,
	joins: Option<Vec<PendingJoin>>,
	join_position: usize,
	finished: bool,
}

impl RowProducer<'_> {
	/// Produces the next row against the current state of `labels`.
	pub fn next_row(&mut self, labels: &LabelMap) -> Option<ImportResult<TableRow>> {
		if self.finished {
			return None;
		}

		let transformer = &self.transformer;
		let result = if let Some((label, record)) = transformer.records.get_index(self.position) {
			self.position += 1;
			transformer.primary_row(label, record, labels, &mut self.pending)
		} else {
			let joins = self.joins.get_or_insert_with(|| {
				std::mem::take(&mut self.pending)
					.into_values()
					.flatten()
					.collect()
			});
			let Some(join) = joins.get(self.join_position) else {
				self.finished = true;
				return None;
			};
			self.join_position += 1;
			transformer.join_row(join, labels)
		};

		if result.is_err() {
			self.finished = true;
		}
		Some(result)
	}

	/// Number of primary rows this producer yields.
	pub fn primary_total(&self) -> usize {
		self.transformer.records.len()
	}
}
