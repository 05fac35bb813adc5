//! `locsync jobs`: job records, newest first.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use locsync_core::types::{Job, JobStatus};
use locsync_sync::job_store;

use super::home_dir;

/// Arguments for `locsync jobs`.
#[derive(Args, Debug)]
pub struct JobsArgs {
    /// Show at most this many jobs.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "user")]
    user: String,
    #[tabled(rename = "updated")]
    updated: String,
    #[tabled(rename = "description")]
    description: String,
}

impl JobsArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut jobs = job_store::list_at(&home).context("failed to load jobs")?;
        jobs.truncate(self.limit);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&jobs).context("failed to serialize jobs JSON")?
            );
            return Ok(());
        }

        if jobs.is_empty() {
            println!("No jobs recorded.");
            return Ok(());
        }

        let rows: Vec<JobRow> = jobs.iter().map(row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn row(job: &Job) -> JobRow {
    let status = match job.status {
        JobStatus::Done => job.status.to_string().green().to_string(),
        JobStatus::Failed => job.status.to_string().red().to_string(),
        JobStatus::Running => job.status.to_string().yellow().to_string(),
    };
    JobRow {
        id: job.id.as_str().chars().take(8).collect(),
        status,
        user: job.user.0.clone(),
        updated: job.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        description: job.description.clone(),
    }
}
