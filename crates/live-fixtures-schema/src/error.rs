//! Error types for the schema catalog.

use thiserror::Error;

/// Errors raised while building or loading a schema catalog.
#[derive(Debug, Error)]
pub enum SchemaError {
	/// Two entities share a name, a table or a subtype discriminator value.
	#[error("Duplicate {kind} in schema catalog: {name}")]
	Duplicate {
		/// What collided ("entity", "table" or "subtype").
		kind: &'static str,
		/// The colliding name.
		name: String,
	},

	/// A non-polymorphic association has no target entity.
	#[error("Association {entity}.{association} must name a target entity")]
	MissingTarget {
		/// Owning entity.
		entity: String,
		/// Association name.
		association: String,
	},

	/// An association points at an entity the catalog does not contain.
	#[error("Association {entity}.{association} targets unknown entity: {target}")]
	UnknownTarget {
		/// Owning entity.
		entity: String,
		/// Association name.
		association: String,
		/// The unknown target name.
		target: String,
	},

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML deserialization error.
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// YAML deserialization error (when yaml feature is enabled).
	#[cfg(feature = "yaml")]
	#[error("YAML error: {0}")]
	Yaml(#[from] serde_yaml::Error),

	/// Schema file has an extension no loader understands.
	#[error("Unsupported schema file extension: {0}")]
	UnsupportedExtension(String),
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_duplicate_error_message() {
		let error = SchemaError::Duplicate {
			kind: "table",
			name: "authors".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Duplicate table in schema catalog: authors"
		);
	}

	#[rstest]
	fn test_unknown_target_message() {
		let error = SchemaError::UnknownTarget {
			entity: "Book".to_string(),
			association: "author".to_string(),
			target: "Writer".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Association Book.author targets unknown entity: Writer"
		);
	}

	#[rstest]
	fn test_toml_error_from() {
		let toml_error = toml::from_str::<toml::Value>("= broken").unwrap_err();
		let schema_error: SchemaError = toml_error.into();
		assert!(matches!(schema_error, SchemaError::Toml(_)));
	}
}
