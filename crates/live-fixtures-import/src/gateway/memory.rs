use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::DbGateway;
use crate::error::GatewayError;
use crate::label::PrimaryKey;
use crate::record::Record;

/// A row kept by [`InMemoryGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
	pub id: i64,
	pub values: Record,
}

#[derive(Debug, Clone, Default)]
struct Tables {
	rows: BTreeMap<String, Vec<StoredRow>>,
	next_ids: HashMap<String, i64>,
}

impl Tables {
	fn allocate(&mut self, table: &str) -> i64 {
		let next = self.next_ids.entry(table.to_string()).or_insert(1);
		let id = *next;
		*next += 1;
		id
	}
}

/// Gateway that keeps tables in memory.
///
/// Inserts are staged until commit; rollback drops them. Keys are per-table
/// auto-increment integers. Clones share the committed tables, so a test can
/// keep a handle while the importer owns another.
///
/// # Examples
///
/// ```
/// use live_fixtures_import::gateway::{DbGateway, InMemoryGateway};
/// use live_fixtures_import::PrimaryKey;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut gateway = InMemoryGateway::new().with_next_id("dogs", 500);
/// gateway.begin_transaction().await.unwrap();
/// let row = json!({ "name": "Rex" }).as_object().unwrap().clone();
/// assert_eq!(gateway.insert("dogs", &row).await.unwrap(), PrimaryKey::Int(500));
/// gateway.commit().await.unwrap();
/// assert_eq!(gateway.rows("dogs").len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
	committed: Arc<Mutex<Tables>>,
	staged: Option<Tables>,
	failures: Vec<(String, usize)>,
	attempts: HashMap<String, usize>,
}

impl InMemoryGateway {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts auto-increment of `table` at `id`, as if rows already existed.
	pub fn with_next_id(self, table: impl Into<String>, id: i64) -> Self {
		self.committed.lock().next_ids.insert(table.into(), id);
		self
	}

	/// Makes the `nth` insert (1-based) into `table` fail.
	pub fn fail_on(mut self, table: impl Into<String>, nth: usize) -> Self {
		self.failures.push((table.into(), nth));
		self
	}

	/// Committed rows of `table`, each carrying its key under `"id"`.
	pub fn rows(&self, table: &str) -> Vec<Record> {
		self.stored_rows(table)
			.into_iter()
			.map(|row| {
				let mut values = row.values;
				values.insert("id".to_string(), Value::from(row.id));
				values
			})
			.collect()
	}

	/// Committed rows of `table` as stored.
	pub fn stored_rows(&self, table: &str) -> Vec<StoredRow> {
		self.committed
			.lock()
			.rows
			.get(table)
			.cloned()
			.unwrap_or_default()
	}

	/// Tables holding at least one committed row.
	pub fn tables(&self) -> Vec<String> {
		self.committed
			.lock()
			.rows
			.iter()
			.filter(|(_, rows)| !rows.is_empty())
			.map(|(table, _)| table.clone())
			.collect()
	}

	pub fn in_transaction(&self) -> bool {
		self.staged.is_some()
	}
}

#[async_trait]
impl DbGateway for InMemoryGateway {
	async fn begin_transaction(&mut self) -> Result<(), GatewayError> {
		if self.staged.is_some() {
			return Err(GatewayError::TransactionActive);
		}
		self.staged = Some(self.committed.lock().clone());
		Ok(())
	}

	async fn insert(&mut self, table: &str, row: &Record) -> Result<PrimaryKey, GatewayError> {
		let staged = self.staged.as_mut().ok_or(GatewayError::NoTransaction)?;

		let attempt = self.attempts.entry(table.to_string()).or_insert(0);
		*attempt += 1;
		if self
			.failures
			.iter()
			.any(|(failing, nth)| failing == table && *nth == *attempt)
		{
			return Err(GatewayError::Rejected(format!(
				"insert #{} into {} refused",
				attempt, table
			)));
		}

		let id = staged.allocate(table);
		staged
			.rows
			.entry(table.to_string())
			.or_default()
			.push(StoredRow {
				id,
				values: row.clone(),
			});
		Ok(PrimaryKey::Int(id))
	}

	async fn commit(&mut self) -> Result<(), GatewayError> {
		let staged = self.staged.take().ok_or(GatewayError::NoTransaction)?;
		*self.committed.lock() = staged;
		Ok(())
	}

	async fn rollback(&mut self) -> Result<(), GatewayError> {
		self.staged.take().ok_or(GatewayError::NoTransaction)?;
		Ok(())
	}
}
