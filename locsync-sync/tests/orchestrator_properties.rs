//! Behavioural properties of the push and pull phases, checked against the
//! in-memory platform.

use std::sync::Arc;

use locsync_core::types::{
    AssetVersion, Component, ComponentId, HubMessage, JobStatus, LocationId, LocationName,
    SelectionEntry, UserId, VersionId,
};
use locsync_sync::{
    memory::{MemoryAccessor, MemorySession, RecordingPublisher},
    pull_to_destination, push_to_staging, Accessor, ComponentOutcome, PullRequest, PushRequest,
    SkipReason, SyncContext, SyncError,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Platform {
    session: Arc<MemorySession>,
    publisher: Arc<RecordingPublisher>,
    input: Arc<MemoryAccessor>,
    staging: Arc<MemoryAccessor>,
    output: Arc<MemoryAccessor>,
}

impl Platform {
    fn new() -> Self {
        Self::with_input(MemoryAccessor::new())
    }

    fn with_input(input: MemoryAccessor) -> Self {
        init_logging();
        let session = Arc::new(MemorySession::new());
        let input = Arc::new(input);
        let staging = Arc::new(MemoryAccessor::new());
        let output = Arc::new(MemoryAccessor::new());
        session.add_location("alice.local", Some(input.clone()));
        session.add_location("ftrack.sync", Some(staging.clone()));
        session.add_location("studio.disk", Some(output.clone()));
        Self {
            session,
            publisher: Arc::new(RecordingPublisher::default()),
            input,
            staging,
            output,
        }
    }

    fn ctx(&self) -> SyncContext {
        SyncContext::new(self.session.clone(), self.publisher.clone())
    }

    fn version(&self, id: &str, components: &[(&str, &str)]) {
        self.session.add_version(AssetVersion {
            id: VersionId::from(id),
            label: None,
            components: components
                .iter()
                .map(|(cid, name)| Component::new(*cid, *name))
                .collect(),
        });
    }

    fn push_request(&self, versions: &[&str]) -> PushRequest {
        PushRequest {
            source: LocationName::from("alice.local"),
            destination: LocationName::from("studio.disk"),
            user: UserId::from("alice"),
            selection: versions.iter().map(|v| SelectionEntry::new(*v)).collect(),
        }
    }
}

fn cid(id: &str) -> ComponentId {
    ComponentId::from(id)
}

// ---------------------------------------------------------------------------
// 1. Review artifacts
// ---------------------------------------------------------------------------

#[test]
fn review_components_are_never_queried_or_copied() {
    let platform = Platform::new();
    platform.version(
        "v1",
        &[
            ("r1", "ftrackreview-mp4"),
            ("c1", "render.mov"),
            ("r2", "ftrackreview-webm"),
        ],
    );
    for id in ["r1", "c1", "r2"] {
        platform.input.set_availability(&cid(id), 100.0);
    }

    let report = push_to_staging(&platform.ctx(), &platform.push_request(&["v1"])).expect("push");

    for accessor in [&platform.input, &platform.staging] {
        assert!(!accessor.availability_calls().contains(&cid("r1")));
        assert!(!accessor.availability_calls().contains(&cid("r2")));
    }
    assert!(!platform.staging.store_calls().contains(&cid("r1")));
    assert_eq!(
        report.run.outcome_of("r2"),
        Some(&ComponentOutcome::Skipped(SkipReason::ReviewArtifact))
    );

    let pull = pull_to_destination(
        &platform.ctx(),
        &PullRequest::from_event(&report.event),
    )
    .expect("pull");
    assert!(!platform.output.availability_calls().contains(&cid("r1")));
    assert_eq!(
        pull.outcome_of("r1"),
        Some(&ComponentOutcome::Skipped(SkipReason::ReviewArtifact))
    );
}

// ---------------------------------------------------------------------------
// 2. Idempotence
// ---------------------------------------------------------------------------

#[test]
fn second_push_performs_no_copies() {
    let platform = Platform::with_input(
        MemoryAccessor::new()
            .with_component(&cid("c1"), b"frames")
            .with_component(&cid("c2"), b"plate"),
    );
    platform.version("v1", &[("c1", "render.mov"), ("c2", "plate.exr")]);
    let ctx = platform.ctx();

    let first = push_to_staging(&ctx, &platform.push_request(&["v1"])).expect("first");
    assert_eq!(first.run.transferred(), 2);
    let copies_after_first = platform.staging.store_calls().len();

    let second = push_to_staging(&ctx, &platform.push_request(&["v1"])).expect("second");
    assert_eq!(platform.staging.store_calls().len(), copies_after_first);
    assert_eq!(second.run.transferred(), 0);
    for report in &second.run.components {
        assert!(matches!(
            report.outcome,
            ComponentOutcome::Skipped(SkipReason::AlreadySynced)
                | ComponentOutcome::Skipped(SkipReason::AlreadyPresent)
        ));
    }
}

#[test]
fn identical_content_at_partial_staging_is_already_present() {
    let platform = Platform::with_input(MemoryAccessor::new().with_component(&cid("c1"), b"frames"));
    platform.version("v1", &[("c1", "render.mov")]);
    platform.staging.store(&Component::new("c1", "render.mov"), b"frames").expect("seed");
    platform.staging.set_availability(&cid("c1"), 40.0);
    let seeded = platform.staging.store_calls().len();

    let report = push_to_staging(&platform.ctx(), &platform.push_request(&["v1"])).expect("push");
    assert_eq!(
        report.run.outcome_of("c1"),
        Some(&ComponentOutcome::Skipped(SkipReason::AlreadyPresent))
    );
    assert_eq!(platform.staging.store_calls().len(), seeded);
    assert_eq!(report.run.status, JobStatus::Done);
}

// ---------------------------------------------------------------------------
// 3. Failure isolation
// ---------------------------------------------------------------------------

#[test]
fn one_failed_copy_does_not_stop_the_batch() {
    let platform = Platform::with_input(
        MemoryAccessor::new()
            .with_component(&cid("c1"), b"1")
            .with_component(&cid("c2"), b"2")
            .with_component(&cid("c3"), b"3"),
    );
    platform.version("v1", &[("c1", "a.exr"), ("c2", "b.exr"), ("c3", "c.exr")]);
    platform.staging.fail_store(&cid("c2"), "permission denied");
    let staging = platform.staging.clone();
    let session = platform.session.clone();

    let report = push_to_staging(&platform.ctx(), &platform.push_request(&["v1"])).expect("push");

    assert_eq!(staging.store_calls(), vec![cid("c1"), cid("c2"), cid("c3")]);
    assert_eq!(report.run.transferred(), 2);
    assert_eq!(
        report.run.outcome_of("c2"),
        Some(&ComponentOutcome::failed("permission denied"))
    );
    assert_eq!(report.run.status, JobStatus::Done);

    let writes = session.job_writes(&report.run.job_id);
    assert!(writes
        .iter()
        .any(|j| j.description == "Component \"b.exr\" with ID c2 failed: permission denied"));
    let failed_at = writes
        .iter()
        .position(|j| j.status == JobStatus::Failed)
        .expect("a failed write");
    assert_eq!(
        writes[failed_at].description,
        "Component \"b.exr\" with ID c2 failed: permission denied"
    );
    assert!(writes[..failed_at]
        .iter()
        .all(|j| j.status == JobStatus::Running));
    let (last, _) = writes.split_last().expect("writes");
    assert_eq!(last.status, JobStatus::Done);
    assert_eq!(
        session.job(&report.run.job_id).expect("job").status,
        JobStatus::Done
    );
}

#[test]
fn lost_progress_writes_do_not_abandon_the_batch() {
    let platform = Platform::with_input(
        MemoryAccessor::new()
            .with_component(&cid("c1"), b"1")
            .with_component(&cid("c2"), b"2"),
    );
    platform.version("v1", &[("c1", "a.exr"), ("c2", "b.exr")]);
    platform.session.fail_description_writes("job store unavailable");
    let staging = platform.staging.clone();
    let publisher = platform.publisher.clone();
    let session = platform.session.clone();

    let report = push_to_staging(&platform.ctx(), &platform.push_request(&["v1"])).expect("push");

    assert_eq!(staging.store_calls(), vec![cid("c1"), cid("c2")]);
    assert_eq!(report.run.transferred(), 2);
    assert_eq!(
        session.job(&report.run.job_id).expect("job").status,
        JobStatus::Done
    );
    assert_eq!(publisher.messages().len(), 1);
}

// ---------------------------------------------------------------------------
// 4. Precondition abort
// ---------------------------------------------------------------------------

#[test]
fn pull_without_accessor_fails_job_without_any_calls() {
    let session = Arc::new(MemorySession::new());
    let staging = Arc::new(MemoryAccessor::new().with_component(&cid("c1"), b"x"));
    session.add_location("ftrack.sync", Some(staging.clone()));
    session.add_location("studio.disk", None);
    session.add_version(AssetVersion {
        id: VersionId::from("v1"),
        label: None,
        components: vec![Component::new("c1", "render.mov")],
    });
    let ctx = SyncContext::new(session.clone(), Arc::new(RecordingPublisher::default()));
    let request = PullRequest {
        source: LocationId::from("loc-ftrack.sync"),
        destination: LocationId::from("loc-studio.disk"),
        components: vec![Component::new("c1", "render.mov").to_ref()],
        user: UserId::from("bob"),
    };

    let report = pull_to_destination(&ctx, &request).expect("pull");

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.components.is_empty());
    assert!(staging.availability_calls().is_empty());
    assert!(staging.store_calls().is_empty());

    let job = session.job(&report.job_id).expect("job");
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.description,
        "Locations are not accessible : studio.disk, ftrack.sync"
    );
    assert!(session
        .job_writes(&report.job_id)
        .iter()
        .all(|j| j.status != JobStatus::Done));
}

// ---------------------------------------------------------------------------
// 5. Role resolution
// ---------------------------------------------------------------------------

#[test]
fn unresolvable_role_aborts_before_job_creation() {
    let platform = Platform::new();
    let ctx = platform.ctx();
    let request = PushRequest {
        destination: LocationName::from("nowhere"),
        ..platform.push_request(&["v1"])
    };

    let err = push_to_staging(&ctx, &request).unwrap_err();
    assert!(matches!(err, SyncError::UnresolvedRole { .. }), "got: {err}");
    assert!(platform.session.jobs().is_empty());
    assert!(platform.publisher.messages().is_empty());
}

#[test]
fn custom_staging_name_is_used_for_the_sync_role() {
    let session = Arc::new(MemorySession::new());
    for name in ["A", "B", "C"] {
        session.add_location(name, Some(Arc::new(MemoryAccessor::new())));
    }
    let mut ctx = SyncContext::new(session.clone(), Arc::new(RecordingPublisher::default()));
    ctx.staging_location = LocationName::from("B");
    let request = PushRequest {
        source: LocationName::from("A"),
        destination: LocationName::from("C"),
        user: UserId::from("u"),
        selection: vec![],
    };

    let report = push_to_staging(&ctx, &request).expect("push");
    let locations = &report.event.data.locations;
    assert_eq!(locations.sync.as_str(), "loc-B");
    assert_eq!(locations.source.as_str(), "loc-A");
    assert_eq!(locations.destination.as_str(), "loc-C");
    assert_eq!(
        session.job(&report.run.job_id).unwrap().status,
        JobStatus::Done
    );
}

// ---------------------------------------------------------------------------
// 6. End to end
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_scenario() {
    let platform = Platform::with_input(MemoryAccessor::new().with_component(&cid("1"), b"render"));
    platform.version("v1", &[("1", "render.mov"), ("2", "ftrackreview_proxy.mp4")]);
    let ctx = platform.ctx();

    let push = push_to_staging(&ctx, &platform.push_request(&["v1"])).expect("push");

    assert_eq!(platform.staging.store_calls(), vec![cid("1")]);
    assert_eq!(push.run.status, JobStatus::Done);
    let listed: Vec<_> = push
        .event
        .data
        .components
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(listed, vec!["1", "2"]);

    let published = platform.publisher.messages();
    assert_eq!(published.len(), 1);
    let HubMessage::Sync(event) = &published[0] else {
        panic!("expected a sync event, got {:?}", published[0]);
    };
    assert_eq!(event.data.action_identifier, "ftrack-to-studio.disk");
    assert_eq!(event.source.user.as_str(), "alice");

    let pull = pull_to_destination(&ctx, &PullRequest::from_event(event)).expect("pull");
    assert_eq!(pull.status, JobStatus::Done);
    assert_eq!(platform.output.store_calls(), vec![cid("1")]);
    assert_eq!(platform.output.content(&cid("1")), Some(b"render".to_vec()));
    assert_eq!(
        pull.outcome_of("2"),
        Some(&ComponentOutcome::Skipped(SkipReason::ReviewArtifact))
    );
}
