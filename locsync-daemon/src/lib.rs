//! Sync daemon: hub queue + serial processor + socket server.
//!
//! The daemon stands in for the event hub on one machine. Launch requests
//! arrive over a unix socket, push runs publish their hand-off events back
//! onto the same queue, and the processor reacts to whatever is routed to
//! the locations this machine hosts.

mod error;
pub mod paths;
pub mod protocol;
mod runtime;

pub use error::DaemonError;
pub use protocol::{
    request_launch, request_status, request_stop, send_request, DaemonRequest, DaemonResponse,
};
pub use runtime::{run, start_blocking, DaemonStats, QueuePublisher, ENV_LOG_FORMAT};
