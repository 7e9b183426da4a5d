//! Error types for Chatty
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Chatty operations
///
/// Store operations report one of the storage variants below; callers
/// classify a returned `anyhow::Error` with `downcast_ref::<ChattyError>()`.
#[derive(Error, Debug)]
pub enum ChattyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backing database could not be opened, configured or migrated
    #[error("Storage unavailable at {}: {reason}", .path.display())]
    StorageUnavailable {
        /// Resolved database location
        path: PathBuf,
        /// Step that failed and its underlying cause
        reason: String,
    },

    /// Operation invoked on a store that is closed
    #[error("{operation}: storage is not open")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Caller-supplied identifier or field failed validation
    #[error("{operation}: {message}")]
    InvalidArgument {
        /// Operation that rejected the input
        operation: &'static str,
        /// What was wrong with the input
        message: String,
    },

    /// The requested session does not exist
    #[error("{operation}: no such session {id}")]
    NotFound {
        /// Operation that looked the session up
        operation: &'static str,
        /// Session identifier that was not found
        id: i64,
    },

    /// A stored timestamp could not be decoded
    #[error("Failed to parse stored timestamp {value:?}: {reason}")]
    ParseFailure {
        /// Raw stored value
        value: String,
        /// Parser diagnostic
        reason: String,
    },

    /// The caller's cancellation token fired before the operation completed
    #[error("{operation}: cancelled")]
    Cancelled {
        /// Operation that was aborted
        operation: &'static str,
    },

    /// SQL failure while running an operation against an open store
    #[error("Storage error in {operation}: {source}")]
    Storage {
        /// Operation that issued the statement
        operation: &'static str,
        /// Underlying SQLite error
        source: rusqlite::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ChattyError {
    /// Returns true when this error is a SQLite interrupt raised by cancellation
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            ChattyError::Storage { source, .. }
                if source.sqlite_error_code() == Some(rusqlite::ErrorCode::OperationInterrupted)
        )
    }
}

/// Result type alias for Chatty operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ChattyError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_storage_unavailable_display_includes_path() {
        let error = ChattyError::StorageUnavailable {
            path: PathBuf::from("/tmp/chatty/chatty.db"),
            reason: "enable foreign keys: disk I/O error".to_string(),
        };
        let s = error.to_string();
        assert!(s.contains("/tmp/chatty/chatty.db"));
        assert!(s.contains("enable foreign keys"));
    }

    #[test]
    fn test_invalid_state_display() {
        let error = ChattyError::InvalidState {
            operation: "create_session",
        };
        assert_eq!(error.to_string(), "create_session: storage is not open");
    }

    #[test]
    fn test_not_found_display() {
        let error = ChattyError::NotFound {
            operation: "load_session",
            id: 42,
        };
        assert_eq!(error.to_string(), "load_session: no such session 42");
    }

    #[test]
    fn test_parse_failure_display_quotes_value() {
        let error = ChattyError::ParseFailure {
            value: "yesterday".to_string(),
            reason: "input contains invalid characters".to_string(),
        };
        assert!(error.to_string().contains("\"yesterday\""));
    }

    #[test]
    fn test_interrupt_detection() {
        let interrupted = ChattyError::Storage {
            operation: "list_sessions",
            source: rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
                None,
            ),
        };
        assert!(interrupted.is_interrupted());

        let other = ChattyError::Storage {
            operation: "list_sessions",
            source: rusqlite::Error::QueryReturnedNoRows,
        };
        assert!(!other.is_interrupted());
        assert!(!ChattyError::Cancelled { operation: "x" }.is_interrupted());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ChattyError = io_error.into();
        assert!(matches!(error, ChattyError::Io(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: ChattyError = yaml_error.into();
        assert!(matches!(error, ChattyError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChattyError>();
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let error: anyhow::Error = ChattyError::Cancelled {
            operation: "append_message",
        }
        .into();
        assert!(matches!(
            error.downcast_ref::<ChattyError>(),
            Some(ChattyError::Cancelled { .. })
        ));
    }
}
