use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{ConversationStore, NewMessage, SessionSummary, Transcript};
use colored::Colorize;
use prettytable::{format, Table};
use tokio_util::sync::CancellationToken;

const NAME_WIDTH: usize = 40;

/// Handle history commands
///
/// Opens the store at the configured location, runs the command and closes
/// the store again, even when the command fails.
pub async fn handle_history(
    config: &Config,
    command: HistoryCommand,
    cancel: &CancellationToken,
) -> Result<()> {
    let store = ConversationStore::open(config.storage_location())?;
    tracing::debug!(path = %store.path().display(), "Using conversation store");

    let outcome = run_command(&store, config, command, cancel).await;
    let closed = store.close().await;

    outcome?;
    closed
}

async fn run_command(
    store: &ConversationStore,
    config: &Config,
    command: HistoryCommand,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        HistoryCommand::List { limit } => {
            let limit = limit.unwrap_or(config.storage.list_limit);
            let sessions = store.list_sessions(cancel, limit).await?;

            if sessions.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            println!("\nConversation History:");
            session_table(&sessions).printstd();
            println!();
            println!(
                "Use {} to view a session.",
                "chatty history show <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::New { name } => {
            let id = store
                .create_session(cancel, name.as_deref().unwrap_or(""))
                .await?;
            println!("{}", format!("Created session {}", id).green());
        }
        HistoryCommand::Show { id, json } => {
            let transcript = store.load_session(cancel, id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&transcript)?);
            } else {
                print!("{}", render_transcript(&transcript));
            }
        }
        HistoryCommand::Rename { id, name } => {
            store.update_session_name(cancel, id, &name).await?;
            println!("{}", format!("Renamed session {}", id).green());
        }
        HistoryCommand::Append { id, role, content } => {
            store
                .append_message(cancel, id, &NewMessage::new(role, content))
                .await?;
            println!("{}", format!("Appended message to session {}", id).green());
        }
        HistoryCommand::Delete { id } => {
            store.delete_session(cancel, id).await?;
            println!("{}", format!("Deleted session {}", id).green());
        }
    }

    Ok(())
}

fn session_table(sessions: &[SessionSummary]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Messages".bold(),
        "Created".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        table.add_row(prettytable::row![
            session.id.to_string().cyan(),
            truncate_name(&session.name),
            session.message_count,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.updated_at.format("%Y-%m-%d %H:%M")
        ]);
    }

    table
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        let head: String = name.chars().take(NAME_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Render a transcript as plain text, one block per message
pub fn render_transcript(transcript: &Transcript) -> String {
    let summary = &transcript.summary;
    let mut out = format!(
        "Session {} - {} ({} messages, updated {})\n",
        summary.id,
        summary.name,
        summary.message_count,
        summary.updated_at.format("%Y-%m-%d %H:%M")
    );

    for message in &transcript.messages {
        out.push_str(&format!(
            "\n[{}] {}:\n{}\n",
            message.created_at.format("%Y-%m-%d %H:%M:%S"),
            message.role,
            message.content
        ));
    }

    out
}
