//! Prelude module for convenient imports.
//!
//! ```rust
//! use live_fixtures_import::prelude::*;
//! ```

pub use crate::commands::{ImportFixturesArgs, ImportFixturesCommand};
pub use crate::error::{CycleError, GatewayError, ImportError, ImportResult};
pub use crate::gateway::{DbGateway, InMemoryGateway};
#[cfg(feature = "sqlite")]
pub use crate::gateway::SqliteGateway;
pub use crate::importer::{FixtureImporter, ImportReport, ImportState, TableOverride};
pub use crate::label::{LabelMap, PrimaryKey};
pub use crate::options::{ImportOptions, ImportSettings};
pub use crate::progress::{ProgressEvent, ProgressSink};
pub use crate::record::RecordSet;
pub use crate::source::{FixtureDirectory, MemorySource, RecordSetSource};
