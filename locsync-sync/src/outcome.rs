//! Per-component outcomes and run reports.

use serde::Serialize;

use locsync_core::types::{ComponentRef, JobId, JobStatus, SyncEvent};

/// Why a component was left alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The name carries the review marker.
    ReviewArtifact,
    /// Not fully present in the input location.
    NotAvailable { availability: f64 },
    /// Already fully present in the target location.
    AlreadySynced,
    /// The copy found byte-identical content at the target.
    AlreadyPresent,
}

/// Result of processing one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComponentOutcome {
    Skipped(SkipReason),
    Transferred,
    Failed { message: String },
}

impl ComponentOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        ComponentOutcome::Failed {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub component: ComponentRef,
    pub outcome: ComponentOutcome,
}

impl ComponentReport {
    pub fn new(component: ComponentRef, outcome: ComponentOutcome) -> Self {
        Self { component, outcome }
    }
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub job_id: JobId,
    pub status: JobStatus,
    pub components: Vec<ComponentReport>,
}

impl RunReport {
    pub fn transferred(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Transferred))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Failed { .. }))
    }

    /// Outcome recorded for the component with `id`, if it was processed.
    pub fn outcome_of(&self, id: &str) -> Option<&ComponentOutcome> {
        self.components
            .iter()
            .find(|r| r.component.id.as_str() == id)
            .map(|r| &r.outcome)
    }

    /// Final status of a run that got past its preconditions.
    ///
    /// Individual component failures mark the job `failed` while the run is
    /// in progress and stay in the report, but the final write is always
    /// `done`.
    pub fn final_status(_components: &[ComponentReport]) -> JobStatus {
        JobStatus::Done
    }

    fn count(&self, pred: impl Fn(&ComponentOutcome) -> bool) -> usize {
        self.components.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Push phase result: the run plus the hand-off event it published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushReport {
    pub run: RunReport,
    pub event: SyncEvent,
}
