//! Labels and the keys they resolve to.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ImportError, ImportResult};

/// Key assigned by the database to an inserted row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
	Int(i64),
	Text(String),
}

impl fmt::Display for PrimaryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(id) => write!(f, "{}", id),
			Self::Text(id) => f.write_str(id),
		}
	}
}

impl From<i64> for PrimaryKey {
	fn from(id: i64) -> Self {
		Self::Int(id)
	}
}

impl From<String> for PrimaryKey {
	fn from(id: String) -> Self {
		Self::Text(id)
	}
}

impl From<&PrimaryKey> for Value {
	fn from(key: &PrimaryKey) -> Self {
		match key {
			PrimaryKey::Int(id) => Value::from(*id),
			PrimaryKey::Text(id) => Value::String(id.clone()),
		}
	}
}

/// Run-scoped table of label to assigned key.
///
/// Entries are write-once: [`LabelMap::record`] refuses to reassign a label.
///
/// # Examples
///
/// ```
/// use live_fixtures_import::{LabelMap, PrimaryKey};
///
/// let mut labels = LabelMap::new();
/// labels.record("tolkien", PrimaryKey::Int(7)).unwrap();
///
/// assert_eq!(labels.get("tolkien"), Some(&PrimaryKey::Int(7)));
/// assert!(labels.record("tolkien", PrimaryKey::Int(8)).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
	entries: HashMap<String, PrimaryKey>,
}

impl LabelMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores the key of a freshly inserted row.
	pub fn record(&mut self, label: impl Into<String>, key: PrimaryKey) -> ImportResult<()> {
		let label = label.into();
		if self.entries.contains_key(&label) {
			return Err(ImportError::DuplicateLabel(label));
		}
		self.entries.insert(label, key);
		Ok(())
	}

	pub fn get(&self, label: &str) -> Option<&PrimaryKey> {
		self.entries.get(label)
	}

	pub fn contains(&self, label: &str) -> bool {
		self.entries.contains_key(label)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PrimaryKey)> {
		self.entries.iter().map(|(label, key)| (label.as_str(), key))
	}
}
