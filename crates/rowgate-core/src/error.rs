//! Error types and result handling for ingestion and query operations.
//!
//! Every fault fails the whole invocation. The taxonomy only exists so the
//! trigger host (HTTP today) can tell a bad payload from an unreachable
//! database from a row that cannot be rendered as JSON.

use thiserror::Error;

/// Result type alias using `RowgateError`.
pub type Result<T> = std::result::Result<T, RowgateError>;

/// Rowgate error types with stable codes.
#[derive(Debug, Error)]
pub enum RowgateError {
    // Input Errors (E1001)
    /// Event payload is not UTF-8 or does not map to a row (E1001).
    #[error("[E1001] Invalid payload: {0}")]
    InvalidPayload(String),

    // System Errors (E3001-E3004)
    /// Database cannot be reached, authenticated against, or the pool is gone
    /// (E3001).
    #[error("[E3001] Database unavailable: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// Statement was rejected: malformed SQL, constraint violation, bind type
    /// mismatch (E3002).
    #[error("[E3002] Statement failed: {0}")]
    Statement(#[source] sqlx::Error),

    /// A row value has no JSON representation (E3003).
    #[error("[E3003] Serialization failed: {0}")]
    Serialization(String),

    /// Settings are invalid or incomplete (E3004).
    #[error("[E3004] Invalid configuration: {0}")]
    Configuration(String),
}

impl RowgateError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "E1001",
            Self::Connectivity(_) => "E3001",
            Self::Statement(_) => "E3002",
            Self::Serialization(_) => "E3003",
            Self::Configuration(_) => "E3004",
        }
    }

    /// Returns whether the fault originates from the caller's input rather
    /// than from the service or its database.
    pub const fn is_client_fault(&self) -> bool {
        matches!(self, Self::InvalidPayload(_))
    }
}

impl From<sqlx::Error> for RowgateError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connectivity(err),
            sqlx::Error::Database(ref db_err) if is_connection_sqlstate(db_err.code().as_deref()) => {
                Self::Connectivity(err)
            },
            sqlx::Error::Configuration(source) => Self::Configuration(source.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Serialization(err.to_string())
            },
            _ => Self::Statement(err),
        }
    }
}

impl From<serde_json::Error> for RowgateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// SQLSTATE classes 08 (connection exception) and 28 (invalid authorization).
fn is_connection_sqlstate(code: Option<&str>) -> bool {
    code.is_some_and(|code| code.starts_with("08") || code.starts_with("28"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(RowgateError::InvalidPayload("x".into()).code(), "E1001");
        assert_eq!(RowgateError::Connectivity(sqlx::Error::PoolClosed).code(), "E3001");
        assert_eq!(RowgateError::Statement(sqlx::Error::RowNotFound).code(), "E3002");
        assert_eq!(RowgateError::Serialization("x".into()).code(), "E3003");
        assert_eq!(RowgateError::Configuration("x".into()).code(), "E3004");
    }

    #[test]
    fn pool_faults_classify_as_connectivity() {
        assert!(matches!(
            RowgateError::from(sqlx::Error::PoolTimedOut),
            RowgateError::Connectivity(_)
        ));
        assert!(matches!(RowgateError::from(sqlx::Error::PoolClosed), RowgateError::Connectivity(_)));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(RowgateError::from(sqlx::Error::Io(io)), RowgateError::Connectivity(_)));
    }

    #[test]
    fn decode_faults_classify_as_serialization() {
        let err = sqlx::Error::Decode("unsupported type".into());
        assert!(matches!(RowgateError::from(err), RowgateError::Serialization(_)));
    }

    #[test]
    fn other_sqlx_faults_classify_as_statement() {
        assert!(matches!(RowgateError::from(sqlx::Error::RowNotFound), RowgateError::Statement(_)));
        let err = sqlx::Error::ColumnNotFound("column3".into());
        assert!(matches!(RowgateError::from(err), RowgateError::Statement(_)));
    }

    #[test]
    fn connection_sqlstates_detected() {
        assert!(is_connection_sqlstate(Some("08006")));
        assert!(is_connection_sqlstate(Some("28P01")));
        assert!(!is_connection_sqlstate(Some("42P01")));
        assert!(!is_connection_sqlstate(None));
    }

    #[test]
    fn only_payload_faults_are_client_faults() {
        assert!(RowgateError::InvalidPayload("x".into()).is_client_fault());
        assert!(!RowgateError::Serialization("x".into()).is_client_fault());
        assert!(!RowgateError::Connectivity(sqlx::Error::PoolClosed).is_client_fault());
    }
}
