//! Association metadata.
//!
//! An [`Association`] is a typed edge from its owning entity to a target
//! entity. Column names that are left implicit follow the conventions in
//! [`crate::naming`]; many-to-many defaults that depend on the target are
//! filled in when the owning catalog is built.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::naming;

/// Kind of relationship an association expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
	/// This entity stores the target's key.
	BelongsTo,
	/// This entity stores a key plus a type column naming the target entity.
	PolymorphicBelongsTo,
	/// The target stores this entity's key; at most one target row.
	HasOne,
	/// The target stores this entity's key.
	HasMany,
	/// Reaches the target through another association.
	HasManyThrough,
	/// Rows are linked through a separate join table.
	ManyToMany,
}

impl AssociationKind {
	/// Whether the owning row carries the foreign key.
	pub fn is_belongs_to(self) -> bool {
		matches!(self, Self::BelongsTo | Self::PolymorphicBelongsTo)
	}

	/// Whether the target is chosen per record.
	pub fn is_polymorphic(self) -> bool {
		matches!(self, Self::PolymorphicBelongsTo)
	}
}

/// A relationship declared on an entity.
///
/// # Examples
///
/// ```
/// use live_fixtures_schema::{Association, AssociationKind};
///
/// let author = Association::belongs_to("author", "Author");
/// assert_eq!(author.kind(), AssociationKind::BelongsTo);
/// assert_eq!(author.foreign_key(), "author_id");
///
/// let owner = Association::polymorphic("owner");
/// assert_eq!(owner.foreign_type(), "owner_type");
/// assert!(owner.target().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
	name: String,
	kind: AssociationKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	target: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	foreign_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	foreign_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	join_table: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	association_foreign_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	through: Option<String>,
}

impl Association {
	/// Creates an association of the given kind.
	pub fn new(name: impl Into<String>, kind: AssociationKind) -> Self {
		Self {
			name: name.into(),
			kind,
			target: None,
			foreign_key: None,
			foreign_type: None,
			join_table: None,
			association_foreign_key: None,
			through: None,
		}
	}

	/// `belongs_to :name` pointing at `target`.
	pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self::new(name, AssociationKind::BelongsTo).with_target(target)
	}

	/// Polymorphic belongs-to; the target comes from each record's type column.
	pub fn polymorphic(name: impl Into<String>) -> Self {
		Self::new(name, AssociationKind::PolymorphicBelongsTo)
	}

	/// `has_one :name` pointing at `target`.
	pub fn has_one(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self::new(name, AssociationKind::HasOne).with_target(target)
	}

	/// `has_many :name` pointing at `target`.
	pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self::new(name, AssociationKind::HasMany).with_target(target)
	}

	/// `has_many :name, through: through`.
	pub fn has_many_through(
		name: impl Into<String>,
		target: impl Into<String>,
		through: impl Into<String>,
	) -> Self {
		let mut association = Self::new(name, AssociationKind::HasManyThrough).with_target(target);
		association.through = Some(through.into());
		association
	}

	/// Many-to-many link stored in a join table.
	pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
		Self::new(name, AssociationKind::ManyToMany).with_target(target)
	}

	/// Sets the target entity.
	pub fn with_target(mut self, target: impl Into<String>) -> Self {
		self.target = Some(target.into());
		self
	}

	/// Sets the foreign key column.
	///
	/// For belongs-to this is the column on the owning row; for many-to-many
	/// it is the join-table column that references the owner.
	pub fn with_foreign_key(mut self, column: impl Into<String>) -> Self {
		self.foreign_key = Some(column.into());
		self
	}

	/// Sets the type column of a polymorphic association.
	pub fn with_foreign_type(mut self, column: impl Into<String>) -> Self {
		self.foreign_type = Some(column.into());
		self
	}

	/// Sets the join table of a many-to-many association.
	pub fn with_join_table(mut self, table: impl Into<String>) -> Self {
		self.join_table = Some(table.into());
		self
	}

	/// Sets the join-table column that references the target.
	pub fn with_association_foreign_key(mut self, column: impl Into<String>) -> Self {
		self.association_foreign_key = Some(column.into());
		self
	}

	/// Association name as it appears as a key in fixture records.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> AssociationKind {
		self.kind
	}

	/// Target entity name; `None` for polymorphic associations.
	pub fn target(&self) -> Option<&str> {
		self.target.as_deref()
	}

	pub fn through(&self) -> Option<&str> {
		self.through.as_deref()
	}

	/// Foreign key column, `"{name}_id"` unless set explicitly.
	pub fn foreign_key(&self) -> Cow<'_, str> {
		match &self.foreign_key {
			Some(column) => Cow::Borrowed(column),
			None => Cow::Owned(naming::belongs_to_key(&self.name)),
		}
	}

	/// Type column, `"{name}_type"` unless set explicitly.
	pub fn foreign_type(&self) -> Cow<'_, str> {
		match &self.foreign_type {
			Some(column) => Cow::Borrowed(column),
			None => Cow::Owned(naming::polymorphic_type_key(&self.name)),
		}
	}

	/// Join table of a many-to-many association.
	pub fn join_table(&self) -> Option<&str> {
		self.join_table.as_deref()
	}

	/// Join-table column referencing the target of a many-to-many association.
	pub fn association_foreign_key(&self) -> Option<&str> {
		self.association_foreign_key.as_deref()
	}

	/// Fills in many-to-many defaults that need the owner and target entities.
	pub(crate) fn complete_join(&mut self, owner: &str, owner_table: &str, target_table: &str) {
		let target = self.target.clone().unwrap_or_default();
		if self.join_table.is_none() {
			self.join_table = Some(naming::join_table_for(owner_table, target_table));
		}
		if self.foreign_key.is_none() {
			self.foreign_key = Some(naming::foreign_key_for(owner));
		}
		if self.association_foreign_key.is_none() {
			self.association_foreign_key = Some(naming::foreign_key_for(&target));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_explicit_foreign_key_wins() {
		let association = Association::belongs_to("writer", "Author").with_foreign_key("author_id");
		assert_eq!(association.foreign_key(), "author_id");
	}

	#[rstest]
	fn test_complete_join_fills_defaults() {
		// Arrange
		let mut association = Association::many_to_many("cafes", "Cafe");

		// Act
		association.complete_join("Dog", "dogs", "cafes");

		// Assert
		assert_eq!(association.join_table(), Some("cafes_dogs"));
		assert_eq!(association.foreign_key(), "dog_id");
		assert_eq!(association.association_foreign_key(), Some("cafe_id"));
	}

	#[rstest]
	fn test_complete_join_keeps_explicit_names() {
		let mut association = Association::many_to_many("visits", "Cafe")
			.with_join_table("dog_cafes")
			.with_foreign_key("visitor_id")
			.with_association_foreign_key("place_id");

		association.complete_join("Dog", "dogs", "cafes");

		assert_eq!(association.join_table(), Some("dog_cafes"));
		assert_eq!(association.foreign_key(), "visitor_id");
		assert_eq!(association.association_foreign_key(), Some("place_id"));
	}

	#[rstest]
	#[case(AssociationKind::BelongsTo, true)]
	#[case(AssociationKind::PolymorphicBelongsTo, true)]
	#[case(AssociationKind::HasMany, false)]
	#[case(AssociationKind::ManyToMany, false)]
	fn test_is_belongs_to(#[case] kind: AssociationKind, #[case] expected: bool) {
		assert_eq!(kind.is_belongs_to(), expected);
	}
}
