//! The copy step shared by both orchestrator phases.

use locsync_core::types::Component;

use crate::error::TransferError;
use crate::job::JobReporter;
use crate::location::LocationHandle;
use crate::outcome::{ComponentOutcome, SkipReason};

/// Copy `component` from `source` into `destination`, reporting on `job`.
///
/// `AlreadyPresent` is a skip; any other transfer error is a per-component
/// failure.
pub(crate) fn transfer_component(
    job: &mut JobReporter,
    component: &Component,
    source: &LocationHandle,
    destination: &LocationHandle,
) -> ComponentOutcome {
    job.describe(format!(
        "Copying Component \"{}\" from {} to {}",
        component.name,
        source.name(),
        destination.name()
    ));

    match destination.add_component(component, source) {
        Ok(()) => {
            job.describe(format!(
                "Copied Component \"{}\" to {}",
                component.name,
                destination.name()
            ));
            ComponentOutcome::Transferred
        }
        Err(err @ TransferError::AlreadyPresent { .. }) => {
            tracing::warn!("{err}");
            job.describe(format!(
                "Component \"{}\" is already present in {}",
                component.name,
                destination.name()
            ));
            ComponentOutcome::Skipped(SkipReason::AlreadyPresent)
        }
        Err(err) => component_failed(job, component, &err),
    }
}

/// Log a failure that only affects `component` and mark the job `failed`.
pub(crate) fn component_failed(
    job: &mut JobReporter,
    component: &Component,
    err: &dyn std::fmt::Display,
) -> ComponentOutcome {
    let message = format!(
        "Component \"{}\" with ID {} failed: {}",
        component.name, component.id, err
    );
    tracing::error!("{message}");
    job.fail(message);
    ComponentOutcome::failed(err.to_string())
}
