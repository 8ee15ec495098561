use async_trait::async_trait;
use sea_query::{Alias, Query, SimpleExpr, SqliteQueryBuilder};
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::DbGateway;
use crate::error::GatewayError;
use crate::label::PrimaryKey;
use crate::record::Record;

/// Gateway writing to SQLite through a `sqlx` pool.
///
/// The whole import runs on one pooled connection inside a single
/// transaction. Keys are the rowids SQLite assigns.
///
/// # Example
///
/// ```rust,no_run
/// use live_fixtures_import::gateway::SqliteGateway;
/// use sqlx::SqlitePool;
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = SqlitePool::connect("sqlite://app.db").await?;
/// let gateway = SqliteGateway::new(pool);
/// # Ok(())
/// # }
/// ```
pub struct SqliteGateway {
	pool: SqlitePool,
	transaction: Option<Transaction<'static, Sqlite>>,
}

impl SqliteGateway {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			transaction: None,
		}
	}

	/// Connects to `url`.
	pub async fn connect(url: &str) -> Result<Self, GatewayError> {
		let pool = SqlitePool::connect(url).await?;
		Ok(Self::new(pool))
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Builds the INSERT statement for `row`.
	pub fn insert_sql(table: &str, row: &Record) -> Result<String, GatewayError> {
		let mut query = Query::insert()
			.into_table(Alias::new(table))
			.or_default_values()
			.to_owned();

		if !row.is_empty() {
			let columns: Vec<Alias> = row.keys().map(|key| Alias::new(key.as_str())).collect();
			let values: Vec<SimpleExpr> = row.values().map(|value| to_sea_value(value).into()).collect();
			query
				.columns(columns)
				.values(values)
				.map_err(|e| GatewayError::Rejected(e.to_string()))?;
		}

		Ok(query.to_string(SqliteQueryBuilder))
	}
}

fn to_sea_value(value: &Value) -> sea_query::Value {
	match value {
		Value::String(s) => sea_query::Value::String(Some(s.clone())),
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				sea_query::Value::BigInt(Some(i))
			} else if let Some(f) = n.as_f64() {
				sea_query::Value::Double(Some(f))
			} else {
				sea_query::Value::String(Some(n.to_string()))
			}
		}
		Value::Bool(b) => sea_query::Value::Bool(Some(*b)),
		Value::Null => sea_query::Value::Int(None),
		_ => sea_query::Value::String(Some(value.to_string())),
	}
}

#[async_trait]
impl DbGateway for SqliteGateway {
	async fn begin_transaction(&mut self) -> Result<(), GatewayError> {
		if self.transaction.is_some() {
			return Err(GatewayError::TransactionActive);
		}
		self.transaction = Some(self.pool.begin().await?);
		Ok(())
	}

	async fn insert(&mut self, table: &str, row: &Record) -> Result<PrimaryKey, GatewayError> {
		let sql = Self::insert_sql(table, row)?;
		let transaction = self
			.transaction
			.as_mut()
			.ok_or(GatewayError::NoTransaction)?;

		let result = sqlx::query(&sql).execute(&mut **transaction).await?;
		Ok(PrimaryKey::Int(result.last_insert_rowid()))
	}

	async fn commit(&mut self) -> Result<(), GatewayError> {
		let transaction = self.transaction.take().ok_or(GatewayError::NoTransaction)?;
		transaction.commit().await?;
		Ok(())
	}

	async fn rollback(&mut self) -> Result<(), GatewayError> {
		let transaction = self.transaction.take().ok_or(GatewayError::NoTransaction)?;
		transaction.rollback().await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use sqlx::sqlite::SqlitePoolOptions;

	async fn memory_pool() -> SqlitePool {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		sqlx::query("CREATE TABLE dogs (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, good BOOLEAN)")
			.execute(&pool)
			.await
			.unwrap();
		pool
	}

	#[rstest]
	fn test_insert_sql_quotes_columns() {
		let row = json!({ "name": "Rex", "good": true }).as_object().unwrap().clone();

		let sql = SqliteGateway::insert_sql("dogs", &row).unwrap();

		assert!(sql.starts_with(r#"INSERT INTO "dogs" ("#));
		assert!(sql.contains(r#""name""#));
		assert!(sql.contains("'Rex'"));
	}

	#[rstest]
	fn test_insert_sql_for_empty_row_uses_default_values() {
		let sql = SqliteGateway::insert_sql("dogs", &Record::new()).unwrap();
		assert!(sql.contains("DEFAULT VALUES"), "unexpected sql: {}", sql);
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_returns_rowid_and_commit_persists() {
		// Arrange
		let pool = memory_pool().await;
		let mut gateway = SqliteGateway::new(pool.clone());
		let row = json!({ "name": "Rex" }).as_object().unwrap().clone();

		// Act
		gateway.begin_transaction().await.unwrap();
		let first = gateway.insert("dogs", &row).await.unwrap();
		let second = gateway.insert("dogs", &Record::new()).await.unwrap();
		gateway.commit().await.unwrap();

		// Assert
		assert_eq!(first, PrimaryKey::Int(1));
		assert_eq!(second, PrimaryKey::Int(2));
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dogs")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(count, 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_pool_is_shared_with_caller() {
		let gateway = SqliteGateway::new(memory_pool().await);

		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dogs")
			.fetch_one(gateway.pool())
			.await
			.unwrap();

		assert_eq!(count, 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_rollback_discards_rows() {
		let pool = memory_pool().await;
		let mut gateway = SqliteGateway::new(pool.clone());
		let row = json!({ "name": "Rex" }).as_object().unwrap().clone();

		gateway.begin_transaction().await.unwrap();
		gateway.insert("dogs", &row).await.unwrap();
		gateway.rollback().await.unwrap();

		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dogs")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(count, 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_constraint_violation_is_reported() {
		let pool = memory_pool().await;
		let mut gateway = SqliteGateway::new(pool);
		let row = json!({ "wings": 2 }).as_object().unwrap().clone();

		gateway.begin_transaction().await.unwrap();
		let result = gateway.insert("dogs", &row).await;

		assert!(matches!(result, Err(GatewayError::Database(_))));
	}
}
