use async_trait::async_trait;
use indexmap::IndexMap;

use super::RecordSetSource;
use crate::error::ImportResult;
use crate::record::RecordSet;

/// Record sets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	tables: IndexMap<String, RecordSet>,
}

impl MemorySource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds the record set of `table`.
	pub fn with_table(mut self, table: impl Into<String>, records: RecordSet) -> Self {
		self.tables.insert(table.into(), records);
		self
	}
}

#[async_trait]
impl RecordSetSource for MemorySource {
	async fn list_tables(&self) -> ImportResult<Vec<String>> {
		let mut tables: Vec<String> = self.tables.keys().cloned().collect();
		tables.sort();
		Ok(tables)
	}

	async fn load(&self, table: &str) -> ImportResult<Option<RecordSet>> {
		Ok(self.tables.get(table).cloned())
	}
}
