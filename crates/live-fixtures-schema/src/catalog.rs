//! Schema catalog trait and its static, pre-loaded implementation.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::association::{Association, AssociationKind};
use crate::entity::EntityType;
use crate::error::{SchemaError, SchemaResult};
use crate::naming;

/// Read-only access to entity and association metadata.
pub trait SchemaCatalog: Send + Sync {
	/// Entity stored in `table`.
	fn entity_type_for(&self, table: &str) -> Option<&EntityType>;

	/// Entity called `name`.
	fn entity(&self, name: &str) -> Option<&EntityType>;

	/// Base associations of `entity`.
	///
	/// Ordering and row transformation read base associations only through
	/// this method, so an adapter may report associations the entity does
	/// not declare itself. Subtype overlays are always added on top.
	fn associations_of<'a>(&'a self, entity: &'a EntityType) -> &'a [Association] {
		entity.associations()
	}

	/// Resolves a type name found in record data (a polymorphic type column
	/// or an inline annotation) to an entity.
	fn resolve_type_name(&self, value: &str) -> Option<&EntityType>;
}

/// On-disk layout of a catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
	#[serde(default)]
	pub entities: Vec<EntityType>,
}

/// A catalog built from an explicit list of entities.
///
/// # Examples
///
/// ```
/// use live_fixtures_schema::{Association, EntityType, SchemaCatalog, StaticCatalog};
///
/// let catalog = StaticCatalog::builder()
///     .entity(EntityType::new("Author", "authors"))
///     .entity(
///         EntityType::new("Book", "books")
///             .with_association(Association::belongs_to("author", "Author")),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(catalog.entity_type_for("books").unwrap().name(), "Book");
/// assert!(catalog.resolve_type_name("Author").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
	entities: IndexMap<String, EntityType>,
	tables: HashMap<String, String>,
	subtypes: HashMap<String, String>,
}

impl StaticCatalog {
	pub fn builder() -> StaticCatalogBuilder {
		StaticCatalogBuilder::default()
	}

	/// Builds a catalog from a parsed document.
	pub fn from_document(document: SchemaDocument) -> SchemaResult<Self> {
		document
			.entities
			.into_iter()
			.fold(Self::builder(), StaticCatalogBuilder::entity)
			.build()
	}

	/// Parses a TOML catalog document.
	///
	/// ```toml
	/// [[entities]]
	/// name = "Book"
	/// table = "books"
	///
	/// [[entities.associations]]
	/// name = "author"
	/// kind = "belongs_to"
	/// target = "Author"
	/// ```
	pub fn from_toml_str(source: &str) -> SchemaResult<Self> {
		let document: SchemaDocument = toml::from_str(source)?;
		Self::from_document(document)
	}

	/// Parses a YAML catalog document with the same layout as the TOML one.
	#[cfg(feature = "yaml")]
	pub fn from_yaml_str(source: &str) -> SchemaResult<Self> {
		let document: SchemaDocument = serde_yaml::from_str(source)?;
		Self::from_document(document)
	}

	/// Loads a catalog file, choosing the format from its extension.
	pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
		let path = path.as_ref();
		let extension = path
			.extension()
			.and_then(|ext| ext.to_str())
			.unwrap_or_default();
		let source = std::fs::read_to_string(path)?;

		match extension {
			"toml" => Self::from_toml_str(&source),
			#[cfg(feature = "yaml")]
			"yml" | "yaml" => Self::from_yaml_str(&source),
			other => Err(SchemaError::UnsupportedExtension(other.to_string())),
		}
	}

	/// Entities in declaration order.
	pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
		self.entities.values()
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}
}

impl SchemaCatalog for StaticCatalog {
	fn entity_type_for(&self, table: &str) -> Option<&EntityType> {
		self.tables
			.get(table)
			.and_then(|name| self.entities.get(name))
	}

	fn entity(&self, name: &str) -> Option<&EntityType> {
		self.entities.get(name)
	}

	fn resolve_type_name(&self, value: &str) -> Option<&EntityType> {
		self.entities.get(value).or_else(|| {
			self.subtypes
				.get(value)
				.and_then(|owner| self.entities.get(owner))
		})
	}
}

/// Builder for [`StaticCatalog`].
#[derive(Debug, Default)]
pub struct StaticCatalogBuilder {
	entities: Vec<EntityType>,
}

impl StaticCatalogBuilder {
	/// Adds an entity.
	pub fn entity(mut self, entity: EntityType) -> Self {
		self.entities.push(entity);
		self
	}

	/// Validates the entities and fills in naming defaults.
	///
	/// Fails on duplicate names, tables or discriminator values, and on
	/// associations whose target is missing or unknown.
	pub fn build(self) -> SchemaResult<StaticCatalog> {
		let mut entities: IndexMap<String, EntityType> = IndexMap::new();
		let mut tables = HashMap::new();
		let mut subtypes = HashMap::new();

		for mut entity in self.entities {
			if entity.table().is_empty() {
				*entity.table_mut() = naming::table_name_for(entity.name());
			}
			if entities.contains_key(entity.name()) {
				return Err(SchemaError::Duplicate {
					kind: "entity",
					name: entity.name().to_string(),
				});
			}
			if tables
				.insert(entity.table().to_string(), entity.name().to_string())
				.is_some()
			{
				return Err(SchemaError::Duplicate {
					kind: "table",
					name: entity.table().to_string(),
				});
			}
			for subtype in entity.subtype_names() {
				if subtypes
					.insert(subtype.to_string(), entity.name().to_string())
					.is_some()
				{
					return Err(SchemaError::Duplicate {
						kind: "subtype",
						name: subtype.to_string(),
					});
				}
			}
			entities.insert(entity.name().to_string(), entity);
		}

		let table_of: HashMap<String, String> = entities
			.values()
			.map(|entity| (entity.name().to_string(), entity.table().to_string()))
			.collect();

		for entity in entities.values_mut() {
			let owner = entity.name().to_string();
			let owner_table = entity.table().to_string();
			for association in entity.all_associations_mut() {
				if association.kind() == AssociationKind::PolymorphicBelongsTo {
					continue;
				}
				let target = association
					.target()
					.ok_or_else(|| SchemaError::MissingTarget {
						entity: owner.clone(),
						association: association.name().to_string(),
					})?
					.to_string();
				let target_table = table_of.get(&target).ok_or_else(|| SchemaError::UnknownTarget {
					entity: owner.clone(),
					association: association.name().to_string(),
					target: target.clone(),
				})?;
				if association.kind() == AssociationKind::ManyToMany {
					association.complete_join(&owner, &owner_table, target_table);
				}
			}
		}

		Ok(StaticCatalog {
			entities,
			tables,
			subtypes,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::io::Write;

	#[fixture]
	fn library() -> StaticCatalog {
		StaticCatalog::builder()
			.entity(EntityType::new("Author", "authors"))
			.entity(
				EntityType::new("Book", "books")
					.with_association(Association::belongs_to("author", "Author"))
					.with_association(Association::many_to_many("genres", "Genre")),
			)
			.entity(EntityType::new("Genre", ""))
			.entity(
				EntityType::new("User", "users")
					.with_inheritance_column("type")
					.with_subtype("Admin", vec![]),
			)
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_lookup_by_table_and_name(library: StaticCatalog) {
		assert_eq!(library.entity_type_for("books").unwrap().name(), "Book");
		assert_eq!(library.entity("Author").unwrap().table(), "authors");
		assert!(library.entity_type_for("missing").is_none());
	}

	#[rstest]
	fn test_default_table_name(library: StaticCatalog) {
		assert_eq!(library.entity("Genre").unwrap().table(), "genres");
	}

	#[rstest]
	fn test_many_to_many_defaults_are_completed(library: StaticCatalog) {
		let book = library.entity("Book").unwrap();
		let genres = &library.associations_of(book)[1];
		assert_eq!(genres.join_table(), Some("books_genres"));
		assert_eq!(genres.foreign_key(), "book_id");
		assert_eq!(genres.association_foreign_key(), Some("genre_id"));
	}

	#[rstest]
	fn test_resolve_type_name_accepts_subtypes(library: StaticCatalog) {
		assert_eq!(library.resolve_type_name("Admin").unwrap().name(), "User");
		assert_eq!(library.resolve_type_name("Book").unwrap().name(), "Book");
		assert!(library.resolve_type_name("Nonsense").is_none());
	}

	#[rstest]
	fn test_duplicate_table_is_rejected() {
		let result = StaticCatalog::builder()
			.entity(EntityType::new("Author", "people"))
			.entity(EntityType::new("Reader", "people"))
			.build();

		assert!(matches!(
			result,
			Err(SchemaError::Duplicate { kind: "table", .. })
		));
	}

	#[rstest]
	fn test_unknown_target_is_rejected() {
		let result = StaticCatalog::builder()
			.entity(
				EntityType::new("Book", "books")
					.with_association(Association::belongs_to("author", "Author")),
			)
			.build();

		assert!(matches!(result, Err(SchemaError::UnknownTarget { .. })));
	}

	#[rstest]
	fn test_missing_target_is_rejected() {
		let result = StaticCatalog::builder()
			.entity(
				EntityType::new("Book", "books")
					.with_association(Association::new("author", AssociationKind::BelongsTo)),
			)
			.build();

		assert!(matches!(result, Err(SchemaError::MissingTarget { .. })));
	}

	#[rstest]
	fn test_from_toml_str() {
		// Arrange
		let source = r#"
[[entities]]
name = "Author"
table = "authors"

[[entities]]
name = "Book"
table = "books"
attributes = ["title", "author_id"]

[[entities.associations]]
name = "author"
kind = "belongs_to"
target = "Author"

[[entities.associations]]
name = "owner"
kind = "polymorphic_belongs_to"
"#;

		// Act
		let catalog = StaticCatalog::from_toml_str(source).unwrap();

		// Assert
		let book = catalog.entity("Book").unwrap();
		assert_eq!(book.attributes(), ["title", "author_id"]);
		assert_eq!(book.associations().len(), 2);
		assert_eq!(
			book.associations()[1].kind(),
			AssociationKind::PolymorphicBelongsTo
		);
	}

	#[cfg(feature = "yaml")]
	#[rstest]
	fn test_from_path_yaml() {
		// Arrange
		let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
		writeln!(
			file,
			r#"
entities:
  - name: User
    table: users
    inheritance_column: type
    subtypes:
      Admin:
        - name: office
          kind: belongs_to
          target: Office
  - name: Office
    table: offices
"#
		)
		.unwrap();

		// Act
		let catalog = StaticCatalog::from_path(file.path()).unwrap();

		// Assert
		let user = catalog.entity("User").unwrap();
		assert_eq!(user.inheritance_column(), Some("type"));
		assert_eq!(user.subtype_associations(Some("Admin")).len(), 1);
	}

	#[rstest]
	fn test_from_path_rejects_unknown_extension() {
		let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
		let result = StaticCatalog::from_path(file.path());
		assert!(matches!(result, Err(SchemaError::UnsupportedExtension(ext)) if ext == "ini"));
	}
}
