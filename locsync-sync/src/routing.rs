//! Action identifiers and message routing.
//!
//! The action identifier is the only routing key on the hub. A launch is
//! addressed to the machine that raised it (`<current>-to-ftrack`), a sync
//! hand-off to the machine hosting the destination
//! (`ftrack-to-<destination>`).

use locsync_core::types::{HubMessage, LocationName, LAUNCH_TOPIC, SYNC_TOPIC};

use crate::pull::PullRequest;
use crate::push::PushRequest;

const LAUNCH_SUFFIX: &str = "-to-ftrack";
const SYNC_PREFIX: &str = "ftrack-to-";

/// Identifier of a launch handled by the host of `current`.
pub fn launch_identifier(current: &LocationName) -> String {
    format!("{current}{LAUNCH_SUFFIX}")
}

/// Identifier of a hand-off handled by the host of `destination`.
pub fn sync_identifier(destination: &LocationName) -> String {
    format!("{SYNC_PREFIX}{destination}")
}

/// Work a message asks of this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Push(PushRequest),
    Pull(PullRequest),
}

/// Decide whether `message` is addressed to one of the `hosted` locations.
///
/// Returns `None` for messages on an unexpected topic and for identifiers
/// naming a location this machine does not serve.
pub fn route(message: &HubMessage, hosted: &[LocationName]) -> Option<Route> {
    match message {
        HubMessage::Launch(event) => {
            if event.topic != LAUNCH_TOPIC {
                return None;
            }
            let addressed = hosted
                .iter()
                .any(|name| launch_identifier(name) == event.data.action_identifier);
            addressed.then(|| Route::Push(PushRequest::from_launch(event)))
        }
        HubMessage::Sync(event) => {
            if event.topic != SYNC_TOPIC {
                return None;
            }
            let addressed = hosted
                .iter()
                .any(|name| sync_identifier(name) == event.data.action_identifier);
            addressed.then(|| Route::Pull(PullRequest::from_event(event)))
        }
    }
}
