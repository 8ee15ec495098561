//! Entity definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::association::Association;

/// A logical table together with its associations.
///
/// Entities that share a table through single-table inheritance declare an
/// `inheritance_column` and one association overlay per discriminator value.
/// The overlay is added to whatever base associations the catalog reports
/// for records carrying that value.
///
/// # Examples
///
/// ```
/// use live_fixtures_schema::{Association, EntityType};
///
/// let user = EntityType::new("User", "users")
///     .with_association(Association::belongs_to("team", "Team"))
///     .with_inheritance_column("type")
///     .with_subtype("Admin", vec![Association::belongs_to("office", "Office")]);
///
/// assert!(user.subtype_associations(None).is_empty());
/// assert_eq!(user.subtype_associations(Some("Admin")).len(), 1);
/// assert!(user.subtype_associations(Some("Guest")).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
	name: String,
	#[serde(default)]
	table: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	attributes: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	associations: Vec<Association>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	inheritance_column: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	subtypes: BTreeMap<String, Vec<Association>>,
}

impl EntityType {
	/// Creates an entity stored in `table`.
	pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table: table.into(),
			attributes: Vec::new(),
			associations: Vec::new(),
			inheritance_column: None,
			subtypes: BTreeMap::new(),
		}
	}

	/// Sets the column names (informative only).
	pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes = attributes.into_iter().map(Into::into).collect();
		self
	}

	/// Adds an association.
	pub fn with_association(mut self, association: Association) -> Self {
		self.associations.push(association);
		self
	}

	/// Sets the discriminator column for single-table inheritance.
	pub fn with_inheritance_column(mut self, column: impl Into<String>) -> Self {
		self.inheritance_column = Some(column.into());
		self
	}

	/// Registers the associations added by records whose discriminator is `value`.
	pub fn with_subtype(mut self, value: impl Into<String>, associations: Vec<Association>) -> Self {
		self.subtypes.insert(value.into(), associations);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Storage table.
	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn attributes(&self) -> &[String] {
		&self.attributes
	}

	/// Base associations, without any subtype overlay.
	pub fn associations(&self) -> &[Association] {
		&self.associations
	}

	pub fn inheritance_column(&self) -> Option<&str> {
		self.inheritance_column.as_deref()
	}

	/// Discriminator values with an overlay.
	pub fn subtype_names(&self) -> impl Iterator<Item = &str> {
		self.subtypes.keys().map(String::as_str)
	}

	/// Overlay added for records whose discriminator is `subtype`.
	///
	/// An absent or unknown discriminator has no overlay.
	pub fn subtype_associations(&self, subtype: Option<&str>) -> &[Association] {
		subtype
			.and_then(|value| self.subtypes.get(value))
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Associations of every subtype overlay, in discriminator order.
	pub fn overlay_associations(&self) -> impl Iterator<Item = &Association> {
		self.subtypes.values().flatten()
	}

	pub(crate) fn table_mut(&mut self) -> &mut String {
		&mut self.table
	}

	pub(crate) fn all_associations_mut(&mut self) -> impl Iterator<Item = &mut Association> {
		self.associations
			.iter_mut()
			.chain(self.subtypes.values_mut().flatten())
	}
}
