//! Pull phase: copy staged components into the final destination.
//!
//! Triggered on the destination side by the [`SyncEvent`] the push phase
//! published. The component list in the event is only a hint; availability
//! is re-evaluated here for every entry.

use locsync_core::types::{Component, ComponentRef, JobStatus, LocationId, SyncEvent, UserId};

use crate::error::SyncError;
use crate::job::JobReporter;
use crate::location::LocationHandle;
use crate::outcome::{ComponentOutcome, ComponentReport, RunReport, SkipReason};
use crate::session::SyncContext;
use crate::transfer::{component_failed, transfer_component};

/// Input of the pull phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Location to download from (the staging location).
    pub source: LocationId,
    pub destination: LocationId,
    pub components: Vec<ComponentRef>,
    pub user: UserId,
}

impl PullRequest {
    /// Pull from the event's staging location into its destination.
    pub fn from_event(event: &SyncEvent) -> Self {
        Self {
            source: event.data.locations.sync.clone(),
            destination: event.data.locations.destination.clone(),
            components: event.data.components.clone(),
            user: event.source.user.clone(),
        }
    }
}

/// Copy every listed component from `source` into `destination`.
///
/// Unknown location ids are returned as errors before any job exists. If
/// either location has no accessor the job is marked `failed` and nothing
/// else happens; otherwise the job always ends `done`.
pub fn pull_to_destination(
    ctx: &SyncContext,
    request: &PullRequest,
) -> Result<RunReport, SyncError> {
    let source = ctx.session.location(&request.source)?;
    let destination = ctx.session.location(&request.destination)?;

    let mut job = JobReporter::create(
        ctx.session.clone(),
        &format!("Sync from {} to {}", source.name(), destination.name()),
        &request.user,
    )?;
    let job_id = job.id().clone();

    if !source.is_reachable() || !destination.is_reachable() {
        let message = format!(
            "Locations are not accessible : {}, {}",
            destination.name(),
            source.name()
        );
        tracing::error!("{message}");
        job.describe(message);
        job.finish(JobStatus::Failed)?;
        return Ok(RunReport {
            job_id,
            status: JobStatus::Failed,
            components: vec![],
        });
    }

    let mut reports = Vec::with_capacity(request.components.len());
    for entry in &request.components {
        let outcome = pull_component(ctx, &mut job, &source, &destination, entry);
        reports.push(ComponentReport::new(entry.clone(), outcome));
    }

    let status = RunReport::final_status(&reports);
    job.finish(status)?;
    Ok(RunReport {
        job_id,
        status,
        components: reports,
    })
}

fn pull_component(
    ctx: &SyncContext,
    job: &mut JobReporter,
    source: &LocationHandle,
    destination: &LocationHandle,
    entry: &ComponentRef,
) -> ComponentOutcome {
    let component = match ctx.session.component(&entry.id) {
        Ok(component) => component,
        Err(err) => {
            let placeholder = Component::new(entry.id.clone(), entry.name.clone());
            return component_failed(job, &placeholder, &err);
        }
    };

    if ctx.is_review_artifact(&component) {
        tracing::debug!("skipping review component {}", component.name);
        return ComponentOutcome::Skipped(SkipReason::ReviewArtifact);
    }

    let at_destination = match destination.get_component_availability(&component) {
        Ok(value) => value,
        Err(err) => return component_failed(job, &component, &err),
    };
    let at_source = match source.get_component_availability(&component) {
        Ok(value) => value,
        Err(err) => return component_failed(job, &component, &err),
    };

    if at_source == 0.0 {
        let message = format!(
            "Component \"{}\" is not available in {}",
            component.name,
            source.name()
        );
        tracing::warn!("{message}");
        job.fail(message);
        return ComponentOutcome::failed(format!("not available in {}", source.name()));
    }

    if at_destination == 100.0 {
        tracing::debug!(
            "component {} already synced to {}",
            component.name,
            destination.name()
        );
        job.describe(format!(
            "Component \"{}\" is already synced to {}",
            component.name,
            destination.name()
        ));
        return ComponentOutcome::Skipped(SkipReason::AlreadySynced);
    }

    transfer_component(job, &component, source, destination)
}
