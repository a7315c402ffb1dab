//! Unified error type for the lookup stores
//!
//! Wraps backend-specific errors while preserving which backend produced
//! them.

use thiserror::Error;

/// Unified error type for lookup store operations
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// PostgreSQL database error
    #[error("PostgreSQL error: {0}")]
    Postgres(sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DataError {
    /// Create a SQLite error with preserved context
    pub fn from_sqlite(e: sqlx::Error) -> Self {
        Self::Sqlite(e)
    }

    /// Create a PostgreSQL error with preserved context
    pub fn from_postgres(e: sqlx::Error) -> Self {
        Self::Postgres(e)
    }

    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(e) | Self::Postgres(e) => {
                matches!(
                    e,
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
            }
            _ => false,
        }
    }

    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
            Self::Config(_) | Self::Io(_) | Self::Serialization(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = DataError::Config("missing url".into());
        assert_eq!(err.to_string(), "Configuration error: missing url");
    }

    #[test]
    fn test_backend_method() {
        assert_eq!(
            DataError::from_sqlite(sqlx::Error::PoolClosed).backend(),
            "sqlite"
        );
        assert_eq!(
            DataError::from_postgres(sqlx::Error::PoolClosed).backend(),
            "postgres"
        );
        assert_eq!(DataError::Config("x".into()).backend(), "unknown");
    }

    #[test]
    fn test_is_transient() {
        assert!(DataError::from_sqlite(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!DataError::Config("bad".into()).is_transient());
    }
}
