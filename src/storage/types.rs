use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Speaker role ("user", "assistant", "system", ...)
    pub role: String,
    /// Message body, may be empty
    pub content: String,
    /// When the store inserted the message
    pub created_at: DateTime<Utc>,
}

/// A message about to be appended to a session
///
/// The store assigns the timestamp at insert time, so callers only supply
/// the role and the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Speaker role; must not be blank
    pub role: String,
    /// Message body, may be empty
    pub content: String,
}

impl NewMessage {
    /// Create a message with an arbitrary role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Metadata for a stored conversation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// User-friendly name
    pub name: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Most recent activity (append or rename)
    pub updated_at: DateTime<Utc>,
    /// Number of messages in the session at read time
    pub message_count: usize,
}

/// A session together with its full, ordered message history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Session metadata with the live message count
    pub summary: SessionSummary,
    /// Messages in the order they were appended
    pub messages: Vec<Message>,
}
