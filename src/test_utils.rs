//! Test utilities for Chatty
//!
//! This module provides common test utilities including temporary store
//! management, direct database access and error assertion helpers.

use crate::error::ChattyError;
use crate::storage::ConversationStore;
use rusqlite::Connection;
use tempfile::TempDir;

/// Create a conversation store backed by a temporary directory
///
/// Returns both the store and the `TempDir` so the caller keeps ownership
/// of the directory (preventing it from being removed).
pub fn temp_store() -> (ConversationStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let db_path = dir.path().join("history.db");
    let store = ConversationStore::open(db_path.to_str().expect("utf-8 temp path"))
        .expect("Failed to open conversation store");
    (store, dir)
}

/// Open a second, independent connection to a store's database file
///
/// Used to inspect or tamper with rows behind the store's back.
pub fn raw_connection(store: &ConversationStore) -> Connection {
    Connection::open(store.path()).expect("Failed to open raw connection")
}

/// Extract the `ChattyError` carried by an `anyhow::Error`
///
/// # Panics
///
/// Panics if the error is not a `ChattyError`
pub fn error_of(error: &anyhow::Error) -> &ChattyError {
    error
        .downcast_ref::<ChattyError>()
        .unwrap_or_else(|| panic!("Expected ChattyError, got: {:#}", error))
}

/// Assert that an error message contains the expected text
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_store_is_inside_temp_dir() {
        let (store, dir) = temp_store();
        assert!(store.path().starts_with(dir.path()));
        assert!(store.path().exists());
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: crate::error::Result<()> =
            Err(ChattyError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: crate::error::Result<()> = Ok(());
        assert_error_contains(result, "error");
    }
}
