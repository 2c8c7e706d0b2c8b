//! Version commands: list, show, backup, restore

use crate::commands::format_millis;
use crate::Session;
use clap::{Args, Subcommand};
use pagetrail_engine::commands::versions::{get_version, list_versions};
use pagetrail_engine::{
    apply_engine_command, EngineCommand, EngineCommandResult, EngineContext,
};

#[derive(Debug, Args)]
pub struct VersionsArgs {
    #[command(subcommand)]
    pub command: VersionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VersionsCommand {
    /// List a page's versions, newest first
    List {
        #[arg(long)]
        page: String,
    },
    /// Print one version's document as JSON
    Show {
        #[arg(long)]
        page: String,
        #[arg(long)]
        version: String,
    },
    /// Save a manual backup of the page
    Backup {
        #[arg(long)]
        page: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Replace the page with a stored version
    Restore {
        #[arg(long)]
        page: String,
        #[arg(long)]
        version: String,
    },
}

pub fn execute(args: VersionsArgs, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        VersionsCommand::List { page } => {
            let versions = list_versions(&session.conn, &session.actor, &page)?;
            if versions.is_empty() {
                println!("No versions");
            }
            for v in versions {
                println!(
                    "{}  {:<6}  {}  {}",
                    v.id,
                    v.kind.as_str(),
                    format_millis(v.created_at),
                    v.label.as_deref().unwrap_or("-")
                );
            }
        }
        VersionsCommand::Show { page, version } => {
            let version = get_version(&session.conn, &session.actor, &page, &version)?;
            println!("{}", serde_json::to_string_pretty(&version)?);
        }
        VersionsCommand::Backup { page, label } => {
            let cmd = EngineCommand::CaptureVersion {
                page_id: page,
                label,
                manual: true,
            };
            let ctx = EngineContext::new(&session.config, &session.clock);
            if let EngineCommandResult::VersionCaptured(result) =
                apply_engine_command(cmd, &mut session.conn, ctx, &session.actor)?
            {
                println!("Backup saved:");
                println!("  version_id: {}", result.version_id);
                if !result.evicted.is_empty() {
                    println!("  evicted: {}", result.evicted.join(", "));
                }
            }
        }
        VersionsCommand::Restore { page, version } => {
            let cmd = EngineCommand::RestoreFromVersion {
                page_id: page,
                version_id: version,
            };
            let ctx = EngineContext::new(&session.config, &session.clock);
            if let EngineCommandResult::Restored(outcome) =
                apply_engine_command(cmd, &mut session.conn, ctx, &session.actor)?
            {
                println!("Page restored:");
                println!("  page_id: {}", outcome.page_id);
                println!("  rows_restored: {}", outcome.rows_restored);
            }
        }
    }
    Ok(())
}
