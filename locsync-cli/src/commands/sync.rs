//! `locsync sync`: launch a two-phase sync for a set of versions.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use locsync_core::{
    catalog, config,
    types::{JobStatus, LaunchValues, LocationName, SelectionEntry, UserId},
};
use locsync_daemon::request_launch;
use locsync_sync::{
    action::build_launch,
    file_session::FileSession,
    pipeline::{run_local, Dispatched},
    session::ChannelPublisher,
    ComponentOutcome, PushReport, PushRequest, RunReport, SkipReason, SyncContext,
};

use super::home_dir;

/// Arguments for `locsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Location the versions are currently in.
    #[arg(long = "from")]
    pub source: String,

    /// Location to deliver the versions to.
    #[arg(long = "to")]
    pub destination: String,

    /// Ids of the versions to sync.
    #[arg(required = true)]
    pub versions: Vec<String>,

    /// User recorded on the jobs. Defaults to `$USER`.
    #[arg(long)]
    pub user: Option<String>,

    /// Hand the launch to the running daemon instead of syncing in-process.
    #[arg(long)]
    pub via_daemon: bool,

    /// Emit machine-readable JSON.
    #[arg(long, conflicts_with = "via_daemon")]
    pub json: bool,
}

#[derive(Serialize)]
struct SyncResultJson<'a> {
    push: &'a RunReport,
    pulls: Vec<&'a RunReport>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let settings = config::load_at(&home).context("failed to load settings")?;
        let known: Vec<LocationName> = catalog::list_locations_at(&home)
            .context("failed to load locations")?
            .into_iter()
            .map(|location| location.name)
            .collect();

        let source = LocationName::from(self.source.clone());
        let user = UserId::from(self.user.clone().unwrap_or_else(default_user));
        let selection: Vec<SelectionEntry> = self
            .versions
            .iter()
            .map(|id| SelectionEntry::new(id.as_str()))
            .collect();
        let values = LaunchValues {
            source_location: source.clone(),
            dest_location: LocationName::from(self.destination.clone()),
        };

        // The launching machine is the one serving the source location.
        let event = build_launch(&source, &values, &selection, &user, &known)
            .map_err(|rejected| anyhow!(rejected.message))?;

        if self.via_daemon {
            let answer = request_launch(&home, event).context("failed to reach the daemon")?;
            println!("{} {}", "✓".green(), answer.message);
            println!("Follow progress with: locsync jobs");
            return Ok(());
        }

        let (publisher, inbox) = ChannelPublisher::channel();
        let ctx = SyncContext::with_settings(
            Arc::new(FileSession::new(home.clone())),
            Arc::new(publisher),
            &settings,
        );
        let request = PushRequest::from_launch(&event);
        let (push, handled) = run_local(&ctx, &request, &inbox, &[values.dest_location.clone()])
            .context("sync failed")?;

        let pulls: Vec<&RunReport> = handled
            .iter()
            .filter_map(|dispatched| match dispatched {
                Dispatched::Pull(run) => Some(run),
                Dispatched::Push(_) => None,
            })
            .collect();

        if self.json {
            let payload = SyncResultJson {
                push: &push.run,
                pulls,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize sync JSON")?
            );
            return Ok(());
        }

        print_push(&push, &settings.sync_location);
        for run in pulls {
            print_run("pull", &values.dest_location, run);
        }
        Ok(())
    }
}

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn print_push(report: &PushReport, staging: &LocationName) {
    print_run("push", staging, &report.run);
}

fn print_run(phase: &str, target: &LocationName, run: &RunReport) {
    let status = match run.status {
        JobStatus::Done => run.status.to_string().green(),
        JobStatus::Failed => run.status.to_string().red(),
        JobStatus::Running => run.status.to_string().yellow(),
    };
    println!(
        "{phase} -> '{target}' [{status}] ({} transferred, {} skipped, {} failed) job {}",
        run.transferred(),
        run.skipped(),
        run.failed(),
        run.job_id
    );
    for report in &run.components {
        println!(
            "  {}  {}",
            outcome_marker(&report.outcome),
            describe(&report.component.name, &report.outcome)
        );
    }
}

fn outcome_marker(outcome: &ComponentOutcome) -> String {
    match outcome {
        ComponentOutcome::Transferred => "✎".green().to_string(),
        ComponentOutcome::Skipped(_) => "·".bright_black().to_string(),
        ComponentOutcome::Failed { .. } => "✗".red().to_string(),
    }
}

fn describe(name: &str, outcome: &ComponentOutcome) -> String {
    match outcome {
        ComponentOutcome::Transferred => format!("{name} copied"),
        ComponentOutcome::Skipped(SkipReason::ReviewArtifact) => {
            format!("{name} skipped (review proxy)")
        }
        ComponentOutcome::Skipped(SkipReason::NotAvailable { availability }) => {
            format!("{name} skipped (only {availability}% available)")
        }
        ComponentOutcome::Skipped(SkipReason::AlreadySynced) => {
            format!("{name} skipped (already synced)")
        }
        ComponentOutcome::Skipped(SkipReason::AlreadyPresent) => {
            format!("{name} skipped (identical content present)")
        }
        ComponentOutcome::Failed { message } => format!("{name} failed: {message}"),
    }
}
