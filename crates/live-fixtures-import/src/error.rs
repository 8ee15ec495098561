//! Error types for the import engine.

use std::fmt;

use live_fixtures_schema::SchemaError;
use thiserror::Error;

/// Failure reported by a [`DbGateway`](crate::gateway::DbGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
	/// An insert, commit or rollback was issued outside a transaction.
	#[error("No transaction is active")]
	NoTransaction,

	/// `begin_transaction` was called twice.
	#[error("A transaction is already active")]
	TransactionActive,

	/// The store refused the row.
	#[error("Row rejected: {0}")]
	Rejected(String),

	/// Driver level failure.
	#[cfg(feature = "sqlite")]
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),
}

/// The dependency graph still had nodes but none of them was free.
///
/// Holds every unresolved entity with the dependencies it was waiting on,
/// sorted by entity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
	pub unresolved: Vec<(String, Vec<String>)>,
}

impl CycleError {
	/// Names of the entities that could not be ordered.
	pub fn entities(&self) -> impl Iterator<Item = &str> {
		self.unresolved.iter().map(|(name, _)| name.as_str())
	}
}

impl fmt::Display for CycleError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Can't compute an insert order. These models seem to depend on each other:"
		)?;
		for (entity, dependencies) in &self.unresolved {
			write!(f, "\n  {}\n    - depends on: {}", entity, dependencies.join(", "))?;
		}
		Ok(())
	}
}

impl std::error::Error for CycleError {}

/// Errors that can occur while importing fixtures.
#[derive(Debug, Error)]
pub enum ImportError {
	/// Settings, order or table mapping are inconsistent.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// Insertion order could not be computed.
	#[error(transparent)]
	Cycle(#[from] CycleError),

	/// A referenced label has no key yet.
	#[error(
		"Unable to find ID for model referenced by label {label} while importing {entity} from {table}.yml. Perhaps it isn't included in these fixtures or it is too late in the insert_order and has not yet been imported."
	)]
	MissingReference {
		/// Label that could not be resolved.
		label: String,
		/// Entity whose record holds the reference.
		entity: String,
		/// Table being imported.
		table: String,
	},

	/// The gateway rejected a row.
	#[error("Failed to insert {} into {table}: {source}", .label.as_deref().unwrap_or("join row"))]
	Insertion {
		/// Destination table.
		table: String,
		/// Label of the row, if it had one.
		label: Option<String>,
		/// Gateway failure.
		#[source]
		source: GatewayError,
	},

	/// A label was recorded twice in one run.
	#[error("Label {0} was already assigned a key in this import")]
	DuplicateLabel(String),

	/// Transaction control failed.
	#[error("Transaction error: {0}")]
	Gateway(#[from] GatewayError),

	/// Schema catalog could not be loaded.
	#[error("Schema error: {0}")]
	Schema(#[from] SchemaError),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// A fixture or settings file could not be parsed.
	#[error("Parse error in {path}: {message}")]
	Parse {
		/// File being parsed.
		path: String,
		/// Parser message.
		message: String,
	},
}

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
