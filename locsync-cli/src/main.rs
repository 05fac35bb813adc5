//! locsync: two-phase component sync between storage locations.
//!
//! # Usage
//!
//! ```text
//! locsync location list
//! locsync location add <name> [--prefix <dir>] [--priority N] [--description TEXT]
//! locsync location menu [--current <name>]
//! locsync version add <id> --location <name> --component <name>=<file>... [--label TEXT]
//! locsync version list
//! locsync sync --from <src> --to <dst> <version-id>... [--user U] [--via-daemon] [--json]
//! locsync jobs [--limit N] [--json]
//! locsync daemon start|stop|status
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    daemon::DaemonCommand, jobs::JobsArgs, location::LocationCommand, sync::SyncArgs,
    version::VersionCommand,
};

#[derive(Parser, Debug)]
#[command(
    name = "locsync",
    version,
    about = "Sync asset components between storage locations through a staging location",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register and inspect storage locations.
    Location {
        #[command(subcommand)]
        command: LocationCommand,
    },

    /// Register asset versions and import their component files.
    Version {
        #[command(subcommand)]
        command: VersionCommand,
    },

    /// Push versions to staging and pull them into the destination.
    Sync(SyncArgs),

    /// List job records.
    Jobs(JobsArgs),

    /// Run or query the sync daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Location { command } => commands::location::run(command),
        Commands::Version { command } => commands::version::run(command),
        Commands::Sync(args) => args.run(),
        Commands::Jobs(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}
