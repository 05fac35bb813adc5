//! Push phase: copy a selection from the input location into staging.
//!
//! Runs on the machine that hosts the input location. Ends by publishing a
//! [`SyncEvent`] routed to the output location so the receiving side can
//! pull from staging.

use locsync_core::types::{
    Component, ComponentRef, EventSource, HubMessage, LaunchEvent, LocationName, SelectionEntry,
    SyncEvent, SyncEventData, SyncLocations, UserId, SYNC_TOPIC,
};

use crate::error::SyncError;
use crate::job::JobReporter;
use crate::outcome::{ComponentOutcome, ComponentReport, PushReport, RunReport, SkipReason};
use crate::roles::{resolve_roles, ResolvedRoles, RoleRequest};
use crate::routing::sync_identifier;
use crate::session::SyncContext;
use crate::transfer::{component_failed, transfer_component};

/// Input of the push phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// Name of the input location.
    pub source: LocationName,
    /// Name of the final destination; only used to route the hand-off.
    pub destination: LocationName,
    pub user: UserId,
    pub selection: Vec<SelectionEntry>,
}

impl PushRequest {
    pub fn from_launch(event: &LaunchEvent) -> Self {
        Self {
            source: event.data.values.source_location.clone(),
            destination: event.data.values.dest_location.clone(),
            user: event.source.user.clone(),
            selection: event.data.selection.clone(),
        }
    }
}

/// Copy every selected component from the input location to staging and
/// publish the hand-off event.
///
/// Fails before creating a job when a role cannot be resolved. Once the job
/// exists, per-component problems are recorded on it and the run ends `done`.
pub fn push_to_staging(ctx: &SyncContext, request: &PushRequest) -> Result<PushReport, SyncError> {
    let roles = resolve_roles(
        &ctx.session.locations()?,
        &RoleRequest {
            sync: ctx.staging_location.clone(),
            input: request.source.clone(),
            output: request.destination.clone(),
        },
    )?;

    let mut job = JobReporter::create(
        ctx.session.clone(),
        &format!("Sync from {} to {}", roles.input.name(), roles.sync.name()),
        &request.user,
    )?;

    let mut reports = Vec::new();
    let mut considered: Vec<ComponentRef> = Vec::new();

    for entry in &request.selection {
        let version = match ctx.session.asset_version(&entry.entity_id) {
            Ok(version) => version,
            Err(err) => {
                tracing::error!("asset version {} could not be loaded: {err}", entry.entity_id);
                job.describe(format!(
                    "Asset version {} could not be loaded: {err}",
                    entry.entity_id
                ));
                continue;
            }
        };

        for component in &version.components {
            considered.push(component.to_ref());
            let outcome = push_component(ctx, &mut job, &roles, component);
            reports.push(ComponentReport::new(component.to_ref(), outcome));
        }
    }

    let status = RunReport::final_status(&reports);
    let job_id = job.id().clone();
    job.finish(status)?;

    let event = SyncEvent {
        topic: SYNC_TOPIC.to_string(),
        data: SyncEventData {
            action_identifier: sync_identifier(roles.output.name()),
            components: considered,
            locations: SyncLocations {
                sync: roles.sync.id().clone(),
                source: roles.input.id().clone(),
                destination: roles.output.id().clone(),
            },
        },
        source: EventSource {
            user: request.user.clone(),
        },
    };
    ctx.publisher.publish(HubMessage::Sync(event.clone()))?;
    tracing::info!(
        "published {} for {} component(s)",
        event.data.action_identifier,
        event.data.components.len()
    );

    Ok(PushReport {
        run: RunReport {
            job_id,
            status,
            components: reports,
        },
        event,
    })
}

fn push_component(
    ctx: &SyncContext,
    job: &mut JobReporter,
    roles: &ResolvedRoles,
    component: &Component,
) -> ComponentOutcome {
    if ctx.is_review_artifact(component) {
        tracing::debug!("skipping review component {}", component.name);
        return ComponentOutcome::Skipped(SkipReason::ReviewArtifact);
    }

    let availability = match roles.input.get_component_availability(component) {
        Ok(value) => value,
        Err(err) => return component_failed(job, component, &err),
    };
    if availability != 100.0 {
        if availability == 0.0 {
            tracing::debug!(
                "component {} is not available in {}",
                component.name,
                roles.input.name()
            );
        } else {
            tracing::debug!(
                "component {} is only {availability}% available in {}",
                component.name,
                roles.input.name()
            );
        }
        job.describe(format!(
            "Component \"{}\" is not available in {}",
            component.name,
            roles.input.name()
        ));
        return ComponentOutcome::Skipped(SkipReason::NotAvailable { availability });
    }

    let staged = match roles.sync.get_component_availability(component) {
        Ok(value) => value,
        Err(err) => return component_failed(job, component, &err),
    };
    if staged == 100.0 {
        tracing::debug!(
            "component {} already synced to {}",
            component.name,
            roles.sync.name()
        );
        job.describe(format!(
            "Component \"{}\" is already synced to {}",
            component.name,
            roles.sync.name()
        ));
        return ComponentOutcome::Skipped(SkipReason::AlreadySynced);
    }

    transfer_component(job, component, &roles.input, &roles.sync)
}
