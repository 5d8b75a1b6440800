//! Abakus CLI - abakus command

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod locks;
mod util;

/// Abakus - content-addressed snapshot backups
#[derive(Parser)]
#[command(name = "abakus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new abakus repository in the current directory
    Init,
    /// Record a snapshot of the working tree
    Snapshot,
    /// List snapshots in the repository
    List,
    /// Show files in a snapshot
    Show {
        /// Snapshot id
        id: u64,
    },
    /// Show changes to the working directory
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cmd::init::run(),
        Commands::Snapshot => cmd::snapshot::run(),
        Commands::List => cmd::list::run(),
        Commands::Show { id } => cmd::show::run(id),
        Commands::Status => cmd::status::run(),
    }
}
