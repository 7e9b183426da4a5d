/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `history` — list, inspect, rename, extend and delete saved sessions

Handlers open the conversation store from the loaded configuration, run a
single store operation under the caller's cancellation token, and close
the store again.
*/

// Conversation history management commands
pub mod history;
