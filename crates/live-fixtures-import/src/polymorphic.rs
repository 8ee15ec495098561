//! Dependencies that only show up in record data.
//!
//! A polymorphic belongs-to stores its target's entity name next to the
//! foreign key, so the schema alone cannot say which table must be
//! imported first. The inferencer reads the records themselves and reports
//! one dependency per type name it recognizes.

use std::collections::{BTreeMap, BTreeSet};

use live_fixtures_schema::{EntityType, SchemaCatalog};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::record::RecordSet;
use crate::transform::effective_associations;

/// Suffix of a column naming the target entity of a polymorphic association.
pub const TYPE_FIELD_SUFFIX: &str = "_type";

static TYPE_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\s*\(([^)]*)\)\s*$").expect("Invalid type annotation regex pattern")
});

/// Entity name to the entity names its records were found to depend on.
pub type DiscoveredEdges = BTreeMap<String, BTreeSet<String>>;

/// Splits `"label (TypeName)"` into `("label", "TypeName")`.
///
/// Returns `None` when the value carries no trailing annotation.
///
/// # Examples
///
/// ```
/// use live_fixtures_import::polymorphic::split_type_annotation;
///
/// assert_eq!(split_type_annotation("rex (Dog)"), Some(("rex", "Dog")));
/// assert_eq!(split_type_annotation("rex"), None);
/// ```
pub fn split_type_annotation(value: &str) -> Option<(&str, &str)> {
	let captures = TYPE_ANNOTATION.captures(value)?;
	let whole = captures.get(0)?;
	let type_name = captures.get(1)?.as_str();
	Some((&value[..whole.start()], type_name))
}

/// Scans record sets for type hints and resolves them through the catalog.
pub struct PolymorphicInferencer<'a> {
	catalog: &'a dyn SchemaCatalog,
}

impl<'a> PolymorphicInferencer<'a> {
	pub fn new(catalog: &'a dyn SchemaCatalog) -> Self {
		Self { catalog }
	}

	/// Dependencies discovered across all `tables`.
	///
	/// Values that do not name a known entity are ignored; they may be
	/// ordinary data that happens to live in a `*_type` column.
	pub fn infer<'r, I>(&self, tables: I) -> DiscoveredEdges
	where
		I: IntoIterator<Item = (&'r EntityType, &'r RecordSet)>,
	{
		let mut edges = DiscoveredEdges::new();
		for (entity, records) in tables {
			for (_, record) in records.iter() {
				let hints = record
					.iter()
					.filter(|(field, _)| field.ends_with(TYPE_FIELD_SUFFIX))
					.filter_map(|(_, value)| value.as_str());

				let annotations = effective_associations(self.catalog, entity, record)
					.filter(|association| association.kind().is_polymorphic())
					.filter_map(|association| record.get(association.name()))
					.filter_map(Value::as_str)
					.filter_map(|value| split_type_annotation(value).map(|(_, type_name)| type_name));

				for type_name in hints.chain(annotations) {
					if let Some(target) = self.catalog.resolve_type_name(type_name) {
						edges
							.entry(entity.name().to_string())
							.or_default()
							.insert(target.name().to_string());
					}
				}
			}
		}
		edges
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use live_fixtures_schema::{Association, StaticCatalog};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn catalog() -> StaticCatalog {
		StaticCatalog::builder()
			.entity(EntityType::new("Dog", "dogs"))
			.entity(EntityType::new("Cat", "cats"))
			.entity(
				EntityType::new("Collar", "collars")
					.with_association(Association::polymorphic("wearer")),
			)
			.build()
			.unwrap()
	}

	#[rstest]
	#[case("rex (Dog)", Some(("rex", "Dog")))]
	#[case("rex(Dog)", Some(("rex", "Dog")))]
	#[case("  big rex   (Dog)  ", Some(("  big rex", "Dog")))]
	#[case("rex", None)]
	#[case("(Dog) rex", None)]
	fn test_split_type_annotation(#[case] value: &str, #[case] expected: Option<(&str, &str)>) {
		assert_eq!(split_type_annotation(value), expected);
	}

	#[rstest]
	fn test_type_column_adds_edge(catalog: StaticCatalog) {
		// Arrange
		let collar = catalog.entity("Collar").unwrap();
		let records = RecordSet::from_value(json!({
			"red": { "wearer": "rex", "wearer_type": "Dog" },
		}))
		.unwrap();

		// Act
		let edges = PolymorphicInferencer::new(&catalog).infer([(collar, &records)]);

		// Assert
		assert_eq!(edges["Collar"], BTreeSet::from(["Dog".to_string()]));
	}

	#[rstest]
	fn test_inline_annotation_adds_edge(catalog: StaticCatalog) {
		let collar = catalog.entity("Collar").unwrap();
		let records = RecordSet::from_value(json!({
			"red": { "wearer": "rex (Dog)" },
			"blue": { "wearer": "tom (Cat)" },
		}))
		.unwrap();

		let edges = PolymorphicInferencer::new(&catalog).infer([(collar, &records)]);

		assert_eq!(
			edges["Collar"],
			BTreeSet::from(["Cat".to_string(), "Dog".to_string()])
		);
	}

	#[rstest]
	fn test_unknown_type_names_are_ignored(catalog: StaticCatalog) {
		let collar = catalog.entity("Collar").unwrap();
		let records = RecordSet::from_value(json!({
			"red": { "blood_type": "O+", "wearer": "rex (Unicorn)", "size_type": 3 },
		}))
		.unwrap();

		let edges = PolymorphicInferencer::new(&catalog).infer([(collar, &records)]);

		assert!(edges.is_empty());
	}
}
