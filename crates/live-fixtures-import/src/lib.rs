//! # live-fixtures-import
//!
//! Imports human-authored fixture files into a live database without
//! truncating tables and without guessing primary keys.
//!
//! Records refer to each other by label. Since keys are assigned by the
//! database on insert, tables must be imported in dependency order and each
//! label's key must be captured as soon as its row is written:
//!
//! 1. [`polymorphic`] finds dependencies that only appear in record data
//! 2. [`order`] turns dependencies into one deterministic insertion order
//! 3. [`transform`] rewrites association labels into foreign keys and
//!    expands many-to-many values into join rows
//! 4. [`importer`] runs everything inside one transaction
//!
//! ## Example
//!
//! ```rust,no_run
//! use live_fixtures_import::prelude::*;
//! use live_fixtures_schema::StaticCatalog;
//!
//! # async fn example() -> ImportResult<()> {
//! let catalog = StaticCatalog::from_path("schema.toml")?;
//! let mut gateway = SqliteGateway::connect("sqlite://app.db").await?;
//!
//! let mut importer = FixtureImporter::new("fixtures", catalog)
//!     .with_options(ImportOptions::new().with_show_progress(true));
//! let report = importer.import_all(&mut gateway).await?;
//! println!("imported {} rows", report.total_rows());
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod error;
pub mod gateway;
pub mod importer;
pub mod label;
pub mod options;
pub mod order;
pub mod polymorphic;
pub mod prelude;
pub mod progress;
pub mod record;
pub mod source;
pub mod transform;

pub use error::{CycleError, GatewayError, ImportError, ImportResult};
pub use importer::{FixtureImporter, ImportReport, ImportState, TableOverride, TableReport};
pub use label::{LabelMap, PrimaryKey};
pub use options::{ImportOptions, ImportSettings};
pub use record::{Record, RecordSet};
pub use source::{FixtureDirectory, MemorySource, RecordSetSource};
pub use transform::{RowKind, RowTransformer, TableRow};
