//! Raw fixture records.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Attribute name to raw value, exactly as written in a fixture.
pub type Record = Map<String, Value>;

/// Top-level key holding file metadata rather than a record.
pub const META_KEY: &str = "_fixture";

/// The labelled records of one fixture file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
	records: IndexMap<String, Record>,
	model_class: Option<String>,
}

impl RecordSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a record set from a parsed document.
	///
	/// The document must be a mapping of label to mapping. A null record is
	/// an empty one. The `_fixture` entry is metadata; its `model_class`
	/// names the entity of the table.
	///
	/// # Examples
	///
	/// ```
	/// use live_fixtures_import::RecordSet;
	/// use serde_json::json;
	///
	/// let set = RecordSet::from_value(json!({
	///     "_fixture": { "model_class": "Dog" },
	///     "rex": { "name": "Rex" },
	///     "fido": null,
	/// }))
	/// .unwrap();
	///
	/// assert_eq!(set.len(), 2);
	/// assert_eq!(set.model_class(), Some("Dog"));
	/// assert!(set.get("fido").unwrap().is_empty());
	/// ```
	pub fn from_value(value: Value) -> Result<Self, String> {
		let entries = match value {
			Value::Object(entries) => entries,
			Value::Null => return Ok(Self::new()),
			other => {
				return Err(format!(
					"expected a mapping of label to record, found {}",
					kind_of(&other)
				));
			}
		};

		let mut set = Self::new();
		for (label, record) in entries {
			if label == META_KEY {
				set.model_class = record
					.get("model_class")
					.and_then(Value::as_str)
					.map(str::to_string);
				continue;
			}
			let record = match record {
				Value::Object(record) => record,
				Value::Null => Record::new(),
				other => {
					return Err(format!(
						"record {} must be a mapping, found {}",
						label,
						kind_of(&other)
					));
				}
			};
			set.records.insert(label, record);
		}
		Ok(set)
	}

	/// Adds a record, returning the previous one stored under `label`.
	pub fn insert(&mut self, label: impl Into<String>, record: Record) -> Option<Record> {
		self.records.insert(label.into(), record)
	}

	pub fn with_record(mut self, label: impl Into<String>, record: Record) -> Self {
		self.insert(label, record);
		self
	}

	pub fn with_model_class(mut self, model_class: impl Into<String>) -> Self {
		self.model_class = Some(model_class.into());
		self
	}

	/// Entity name declared by the file's `_fixture` entry.
	pub fn model_class(&self) -> Option<&str> {
		self.model_class.as_deref()
	}

	pub fn get(&self, label: &str) -> Option<&Record> {
		self.records.get(label)
	}

	/// Label and record at `index` in file order.
	pub fn get_index(&self, index: usize) -> Option<(&str, &Record)> {
		self.records
			.get_index(index)
			.map(|(label, record)| (label.as_str(), record))
	}

	pub fn labels(&self) -> impl Iterator<Item = &str> {
		self.records.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
		self.records.iter().map(|(label, record)| (label.as_str(), record))
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

impl FromIterator<(String, Record)> for RecordSet {
	fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
		Self {
			records: iter.into_iter().collect(),
			model_class: None,
		}
	}
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "a list",
		Value::Object(_) => "a mapping",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_from_value_keeps_file_order() {
		let set = RecordSet::from_value(json!({
			"zeta": { "name": "Z" },
			"alpha": { "name": "A" },
		}))
		.unwrap();

		assert_eq!(set.labels().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
	}

	#[rstest]
	#[case(json!([1, 2]))]
	#[case(json!("text"))]
	#[case(json!({ "rex": 3 }))]
	fn test_from_value_rejects_non_mappings(#[case] value: Value) {
		assert!(RecordSet::from_value(value).is_err());
	}

	#[rstest]
	fn test_null_document_is_empty() {
		assert!(RecordSet::from_value(Value::Null).unwrap().is_empty());
	}
}
