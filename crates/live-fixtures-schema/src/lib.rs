//! # live-fixtures-schema
//!
//! Entity and association metadata consumed by the fixture import engine.
//!
//! The engine never inspects an ORM directly. Instead it reads a
//! [`SchemaCatalog`]: an explicit table of [`EntityType`]s and their
//! [`Association`]s. [`StaticCatalog`] is the stock implementation, built in
//! code or loaded from a TOML or YAML document.
//!
//! ## Example
//!
//! ```
//! use live_fixtures_schema::{Association, EntityType, SchemaCatalog, StaticCatalog};
//!
//! let catalog = StaticCatalog::builder()
//!     .entity(EntityType::new("Dog", "dogs"))
//!     .entity(
//!         EntityType::new("Cafe", "cafes")
//!             .with_association(Association::many_to_many("dogs", "Dog")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let cafe = catalog.entity_type_for("cafes").unwrap();
//! assert_eq!(catalog.associations_of(cafe)[0].join_table(), Some("cafes_dogs"));
//! ```

pub mod association;
pub mod catalog;
pub mod entity;
pub mod error;
pub mod naming;

pub use association::{Association, AssociationKind};
pub use catalog::{SchemaCatalog, SchemaDocument, StaticCatalog, StaticCatalogBuilder};
pub use entity::EntityType;
pub use error::{SchemaError, SchemaResult};
