//! Chatty - terminal chat client library
//!
//! This library provides the persistence layer of the Chatty chat client:
//! durable, resumable conversation sessions with ordered message history,
//! plus the configuration and session-management commands built on it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: SQLite-backed `ConversationStore` (sessions, messages, transcripts)
//! - `commands`: Session-management command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatty::storage::{ConversationStore, NewMessage};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ConversationStore::open("")?;
//!     let cancel = CancellationToken::new();
//!
//!     let id = store.create_session(&cancel, "Trip").await?;
//!     store.append_message(&cancel, id, &NewMessage::user("hi")).await?;
//!     let transcript = store.load_session(&cancel, id).await?;
//!     assert_eq!(transcript.summary.message_count, 1);
//!
//!     store.close().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChattyError, Result};
pub use storage::{ConversationStore, Message, NewMessage, SessionSummary, Transcript};

#[cfg(test)]
pub mod test_utils;
