//! Where record sets come from.
//!
//! The engine asks a [`RecordSetSource`] for the tables it can provide and
//! then for each table's [`RecordSet`]. [`FixtureDirectory`] reads fixture
//! files from disk; [`MemorySource`] holds record sets built in code.

mod filesystem;
mod memory;

pub use filesystem::{FixtureDirectory, table_name_for_path};
pub use memory::MemorySource;

use async_trait::async_trait;

use crate::error::ImportResult;
use crate::record::RecordSet;

/// Provider of raw record sets keyed by table name.
#[async_trait]
pub trait RecordSetSource: Send + Sync {
	/// Tables this source has a record set for, sorted by name.
	async fn list_tables(&self) -> ImportResult<Vec<String>>;

	/// The record set of `table`, or `None` when the source has none.
	async fn load(&self, table: &str) -> ImportResult<Option<RecordSet>>;
}
