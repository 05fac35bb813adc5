//! Shared dispatch entrypoint used by the CLI and the daemon.

use std::sync::mpsc::Receiver;

use locsync_core::types::{HubMessage, LocationName};

use crate::error::SyncError;
use crate::outcome::{PushReport, RunReport};
use crate::pull::pull_to_destination;
use crate::push::{push_to_staging, PushRequest};
use crate::routing::{route, Route};
use crate::session::SyncContext;

/// Result of handling one hub message.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Push(PushReport),
    Pull(RunReport),
}

/// Run whichever phase `message` asks of the `hosted` locations.
///
/// `Ok(None)` means the message was not addressed to this machine.
pub fn dispatch(
    ctx: &SyncContext,
    message: &HubMessage,
    hosted: &[LocationName],
) -> Result<Option<Dispatched>, SyncError> {
    match route(message, hosted) {
        Some(Route::Push(request)) => Ok(Some(Dispatched::Push(push_to_staging(ctx, &request)?))),
        Some(Route::Pull(request)) => Ok(Some(Dispatched::Pull(pull_to_destination(
            ctx, &request,
        )?))),
        None => {
            tracing::debug!(
                "ignoring {} on {}: not hosted here",
                message.action_identifier(),
                message.topic()
            );
            Ok(None)
        }
    }
}

/// Run both phases in one process.
///
/// Pushes `request`, then drains `inbox` (the receiving end of the
/// context's publisher) and dispatches every queued message for `hosted`.
pub fn run_local(
    ctx: &SyncContext,
    request: &PushRequest,
    inbox: &Receiver<HubMessage>,
    hosted: &[LocationName],
) -> Result<(PushReport, Vec<Dispatched>), SyncError> {
    let push = push_to_staging(ctx, request)?;
    let mut handled = Vec::new();
    while let Ok(message) = inbox.try_recv() {
        if let Some(result) = dispatch(ctx, &message, hosted)? {
            handled.push(result);
        }
    }
    Ok((push, handled))
}
