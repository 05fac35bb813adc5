//! Job progress reporting for one orchestrator run.
//!
//! The job description is a single line overwritten on every step, so it
//! always shows the most recent activity. Each step is also logged.
//!
//! Progress writes never abort a run: a store error while describing a step
//! is logged and the batch carries on. Only [`JobReporter::create`] and
//! [`JobReporter::finish`] report store errors to the caller.

use std::sync::Arc;

use locsync_core::types::{Job, JobId, JobStatus, UserId};

use crate::error::SyncError;
use crate::session::{JobUpdate, Session};

/// Owns the job of a run until it is finished.
pub struct JobReporter {
    session: Arc<dyn Session>,
    job: Job,
}

impl JobReporter {
    /// Create the job in status `running`.
    pub fn create(
        session: Arc<dyn Session>,
        description: &str,
        user: &UserId,
    ) -> Result<Self, SyncError> {
        let job = session.create_job(description, user)?;
        tracing::info!("job {} started: {}", job.id, description);
        Ok(Self { session, job })
    }

    pub fn id(&self) -> &JobId {
        &self.job.id
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Overwrite the description; the status is left untouched.
    pub fn describe(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("job {}: {}", self.job.id, text);
        self.record(JobUpdate::description(text));
    }

    /// Record a per-component failure: the description and status `failed`
    /// are written together. The run keeps going and [`finish`](Self::finish)
    /// overwrites the status.
    pub fn fail(&mut self, text: impl Into<String>) {
        self.record(JobUpdate {
            description: Some(text.into()),
            status: Some(JobStatus::Failed),
        });
    }

    /// Set the final status and hand back the record.
    pub fn finish(mut self, status: JobStatus) -> Result<Job, SyncError> {
        self.update(JobUpdate::status(status))?;
        tracing::info!("job {} finished: {}", self.job.id, status);
        Ok(self.job)
    }

    /// Persist a partial update.
    pub fn update(&mut self, update: JobUpdate) -> Result<(), SyncError> {
        self.job = self.session.update_job(&self.job.id, update)?;
        Ok(())
    }

    fn record(&mut self, update: JobUpdate) {
        if let Err(err) = self.update(update) {
            tracing::warn!("job {}: progress not saved: {err}", self.job.id);
        }
    }
}
