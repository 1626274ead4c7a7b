//! Error types for rowmap

use thiserror::Error;

/// Error type reported by a database gateway.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for rowmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// The mapped type lacks metadata required by the requested operation
    #[error("Mapping error on '{entity}': {message}")]
    Mapping { entity: String, message: String },

    /// Key-dependent operation requested on a type without key members
    #[error("'{operation}' on '{entity}' requires at least one key member")]
    KeyRequired {
        entity: String,
        operation: &'static str,
    },

    /// Conditional operation invoked without a predicate
    #[error("'{operation}' on '{entity}' requires a predicate")]
    PredicateRequired {
        entity: String,
        operation: &'static str,
    },

    /// Expression node that cannot be expressed in SQL
    #[error("Cannot translate {construct}: {message}")]
    Translation { construct: String, message: String },

    /// Failure reported by the database gateway
    #[error("Database error during '{operation}' on '{entity}': {source}")]
    DataAccess {
        operation: &'static str,
        entity: String,
        #[source]
        source: BoxError,
    },

    /// A database value could not be coerced into the requested type
    #[error("Cannot convert {found} into {expected}")]
    Conversion {
        expected: &'static str,
        found: String,
    },

    /// Commit or rollback without an active transaction, or a nested begin
    #[error("Transaction error: {message}")]
    Transaction { message: String },

    /// Invalid options document
    #[error("Configuration error: {0}")]
    Configuration(#[from] serde_json::Error),
}

/// Convenience Result type for rowmap operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new mapping error
    pub fn mapping(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a new key required error
    pub fn key_required(entity: impl Into<String>, operation: &'static str) -> Self {
        Self::KeyRequired {
            entity: entity.into(),
            operation,
        }
    }

    /// Create a new predicate required error
    pub fn predicate_required(entity: impl Into<String>, operation: &'static str) -> Self {
        Self::PredicateRequired {
            entity: entity.into(),
            operation,
        }
    }

    /// Create a new translation error
    pub fn translation(construct: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Translation {
            construct: construct.into(),
            message: message.into(),
        }
    }

    /// Wrap a gateway failure with the operation and entity it happened in
    pub fn data_access(operation: &'static str, entity: impl Into<String>, source: BoxError) -> Self {
        Self::DataAccess {
            operation,
            entity: entity.into(),
            source,
        }
    }

    /// Create a new conversion error
    pub fn conversion(expected: &'static str, found: impl Into<String>) -> Self {
        Self::Conversion {
            expected,
            found: found.into(),
        }
    }

    /// Create a new transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_required_error() {
        let err = Error::key_required("AuditLog", "delete");
        assert!(matches!(err, Error::KeyRequired { .. }));
        assert_eq!(
            err.to_string(),
            "'delete' on 'AuditLog' requires at least one key member"
        );
    }

    #[test]
    fn test_predicate_required_error() {
        let err = Error::predicate_required("User", "update_where");
        assert_eq!(err.to_string(), "'update_where' on 'User' requires a predicate");
    }

    #[test]
    fn test_translation_error() {
        let err = Error::translation("IN list", "empty value list");
        assert!(matches!(err, Error::Translation { .. }));
        assert_eq!(err.to_string(), "Cannot translate IN list: empty value list");
    }

    #[test]
    fn test_data_access_keeps_source() {
        let source: BoxError = "disk I/O error".into();
        let err = Error::data_access("insert", "User", source);
        assert_eq!(
            err.to_string(),
            "Database error during 'insert' on 'User': disk I/O error"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_configuration_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
