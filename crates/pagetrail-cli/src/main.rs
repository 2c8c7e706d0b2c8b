//! pagetrail CLI
//!
//! Operator interface over the page history engine

use clap::{Parser, Subcommand, ValueEnum};
use pagetrail_core::logging_facility::{init, Profile};
use pagetrail_core::{HistoryConfig, SystemClock};
use pagetrail_core_types::{AccountTier, ActorContext};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "pagetrail")]
#[command(about = "pagetrail - page version history and undo", long_about = None)]
struct Cli {
    /// SQLite database holding pages and their history
    #[arg(long, global = true, default_value = ".pagetrail/pages.db")]
    db: PathBuf,

    /// History settings (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Id of the acting user
    #[arg(long, global = true)]
    actor: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = TierArg::Free)]
    tier: TierArg,

    /// Human-readable debug logs instead of JSON
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TierArg {
    Free,
    Privileged,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Version operations
    Versions(commands::versions::VersionsArgs),
    /// Audit history operations
    History(commands::history::HistoryArgs),
}

/// Everything a command needs besides its own arguments.
pub struct Session {
    pub conn: rusqlite::Connection,
    pub config: HistoryConfig,
    pub clock: SystemClock,
    pub actor: ActorContext,
}

fn open_session(cli: &Cli) -> Result<Session, Box<dyn std::error::Error>> {
    let actor_id = cli.actor.clone().ok_or("--actor is required")?;
    let config = match &cli.config {
        Some(path) => HistoryConfig::load(path)?,
        None => HistoryConfig::default(),
    };
    if let Some(parent) = cli.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = pagetrail_store::db::open_ready(&cli.db)?;
    let tier = match cli.tier {
        TierArg::Free => AccountTier::Free,
        TierArg::Privileged => AccountTier::Privileged,
    };
    Ok(Session {
        conn,
        config,
        clock: SystemClock,
        actor: ActorContext::new(actor_id, tier),
    })
}

fn main() {
    let cli = Cli::parse();
    init(if cli.verbose {
        Profile::Development
    } else {
        Profile::Production
    });

    let result = open_session(&cli).and_then(|mut session| match cli.command {
        Commands::Versions(args) => commands::versions::execute(args, &mut session),
        Commands::History(args) => commands::history::execute(args, &mut session),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
