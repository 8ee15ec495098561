//! Database gateways.
//!
//! The engine only ever needs four primitives: open a transaction, insert a
//! row and learn its key, commit, roll back. [`DbGateway`] captures them;
//! [`InMemoryGateway`] keeps rows in memory and [`SqliteGateway`] writes
//! through `sqlx`.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::{InMemoryGateway, StoredRow};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGateway;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::label::PrimaryKey;
use crate::record::Record;

/// Transactional insert primitives.
#[async_trait]
pub trait DbGateway: Send {
	/// Opens the transaction every following insert belongs to.
	async fn begin_transaction(&mut self) -> Result<(), GatewayError>;

	/// Inserts `row` into `table` and returns the key the store assigned.
	async fn insert(&mut self, table: &str, row: &Record) -> Result<PrimaryKey, GatewayError>;

	/// Makes every insert of the transaction visible.
	async fn commit(&mut self) -> Result<(), GatewayError>;

	/// Discards every insert of the transaction.
	async fn rollback(&mut self) -> Result<(), GatewayError>;
}
