//! History commands: list, undo

use crate::commands::format_millis;
use crate::Session;
use clap::{Args, Subcommand};
use pagetrail_engine::commands::history::list_history;
use pagetrail_engine::{
    apply_engine_command, EngineCommand, EngineCommandResult, EngineContext,
};
use pagetrail_store::audit::HistoryQuery;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List audit entries for a page, newest first
    List {
        #[arg(long)]
        page: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Print each entry's change lines
        #[arg(long)]
        changes: bool,
    },
    /// Undo every change recorded after an entry
    Undo {
        /// Entry to return to
        #[arg(long)]
        log: String,
        /// Require the entry to belong to this page
        #[arg(long)]
        page: Option<String>,
    },
}

pub fn execute(args: HistoryArgs, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        HistoryCommand::List {
            page,
            limit,
            changes,
        } => {
            let query = HistoryQuery {
                limit,
                ..HistoryQuery::default()
            };
            let entries = list_history(&session.conn, &session.actor, &page, &query)?;
            if entries.is_empty() {
                println!("No history");
            }
            for entry in entries {
                println!(
                    "{}  {}  {:<10}  {}",
                    entry.id,
                    format_millis(entry.created_at),
                    entry.category.as_str(),
                    entry.summary
                );
                if changes {
                    for line in &entry.changes {
                        println!("    {}", line);
                    }
                }
            }
        }
        HistoryCommand::Undo { log, page } => {
            let cmd = EngineCommand::RestoreToLogEntry { log_id: log, page_id: page };
            let ctx = EngineContext::new(&session.config, &session.clock);
            if let EngineCommandResult::Restored(outcome) =
                apply_engine_command(cmd, &mut session.conn, ctx, &session.actor)?
            {
                println!("Undo complete:");
                println!("  page_id: {}", outcome.page_id);
                println!("  reverted_count: {}", outcome.reverted_count);
            }
        }
    }
    Ok(())
}
