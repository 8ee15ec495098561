//! # Live Fixtures
//!
//! Imports a directory of hand-written fixture files into a database that is
//! already in use.
//!
//! Unlike a test fixture loader, nothing is truncated and no keys are
//! invented up front: every record is inserted with the key the database
//! assigns, and the symbolic labels fixtures use to point at each other are
//! resolved to those keys as the import goes. Tables are imported in an order
//! derived from the schema's associations, so a record is always inserted
//! after the records it references.
//!
//! ## Crates
//!
//! - [`schema`] - entity types, associations and the catalog that maps tables to them
//! - [`import`] - ordering, row transformation, label resolution and the importer itself
//!
//! ## Feature Flags
//!
//! - `yaml` (default) - YAML fixture and schema files
//! - `sqlite` (default) - SQLite gateway built on `sqlx`
//! - `full` - everything above
//!
//! ## Quick Example
//!
//! ```rust
//! use live_fixtures::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let catalog = StaticCatalog::builder()
//!     .entity(EntityType::new("Owner", "owners"))
//!     .entity(
//!         EntityType::new("Pet", "pets")
//!             .with_association(Association::belongs_to("owner", "Owner")),
//!     )
//!     .build()
//!     .unwrap();
//! let source = MemorySource::new()
//!     .with_table("pets", RecordSet::from_value(json!({ "rex": { "owner": "alice" } })).unwrap())
//!     .with_table("owners", RecordSet::from_value(json!({ "alice": { "name": "Alice" } })).unwrap());
//!
//! let mut importer = FixtureImporter::from_source(source, catalog);
//! let mut gateway = InMemoryGateway::new().with_next_id("owners", 100);
//! importer.import_all(&mut gateway).await.unwrap();
//!
//! assert_eq!(gateway.rows("pets")[0]["owner_id"], json!(100));
//! # });
//! ```

pub use live_fixtures_import as import;
pub use live_fixtures_schema as schema;

/// Re-export commonly used types
pub mod prelude {
	pub use live_fixtures_import::prelude::*;
	pub use live_fixtures_schema::{
		Association, AssociationKind, EntityType, SchemaCatalog, StaticCatalog,
	};
}
