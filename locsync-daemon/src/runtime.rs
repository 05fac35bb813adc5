use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};

use locsync_core::{
    catalog::root_at,
    config::{self, Settings},
    types::{HubMessage, JobId, LocationName, LAUNCH_TOPIC},
};
use locsync_sync::{
    action::ActionResponse,
    file_session::FileSession,
    job_store,
    pipeline::{self, Dispatched},
    EventPublisher, SyncContext, SyncError,
};

use crate::error::{io_err, DaemonError};
use crate::paths::{run_dir, socket_path, RECENT_JOBS};
use crate::protocol::{DaemonRequest, DaemonResponse, CMD_LAUNCH, CMD_STATUS, CMD_STOP};

/// Selects the log output format (`json` or plain text).
pub const ENV_LOG_FORMAT: &str = "LOCSYNC_LOG_FORMAT";

/// Counters over every message the processor has taken off the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DaemonStats {
    pub received: u64,
    pub pushes: u64,
    pub pulls: u64,
    /// Messages addressed to locations this machine does not host.
    pub ignored: u64,
    pub errors: u64,
    pub last_job: Option<JobId>,
    pub last_processed_at_unix: u64,
}

impl DaemonStats {
    fn record(&mut self, outcome: &Result<Option<Dispatched>, SyncError>, at_unix: u64) {
        self.received += 1;
        self.last_processed_at_unix = at_unix;
        match outcome {
            Ok(Some(Dispatched::Push(report))) => {
                self.pushes += 1;
                self.last_job = Some(report.run.job_id.clone());
            }
            Ok(Some(Dispatched::Pull(report))) => {
                self.pulls += 1;
                self.last_job = Some(report.job_id.clone());
            }
            Ok(None) => self.ignored += 1,
            Err(_) => self.errors += 1,
        }
    }
}

/// [`EventPublisher`] that feeds the daemon's own hub queue.
#[derive(Debug, Clone)]
pub struct QueuePublisher {
    sender: mpsc::UnboundedSender<HubMessage>,
}

impl QueuePublisher {
    pub fn new(sender: mpsc::UnboundedSender<HubMessage>) -> Self {
        Self { sender }
    }
}

impl EventPublisher for QueuePublisher {
    fn publish(&self, message: HubMessage) -> Result<(), SyncError> {
        self.sender
            .send(message)
            .map_err(|_| SyncError::Publish("daemon hub queue closed".to_string()))
    }
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let settings = config::load_at(home)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf(), settings))
}

/// Run the daemon runtime until `stop` or ctrl-c.
pub async fn run(home: PathBuf, settings: Settings) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    if settings.host_locations.is_empty() {
        tracing::warn!("no hosted locations configured; every message will be ignored");
    }
    let hosted = Arc::new(settings.host_locations.clone());
    let stats = Arc::new(RwLock::new(DaemonStats::default()));
    let started_at_unix = unix_seconds_now();

    let (hub_tx, hub_rx) = mpsc::unbounded_channel::<HubMessage>();
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let ctx = SyncContext::with_settings(
        Arc::new(FileSession::new(home.clone())),
        Arc::new(QueuePublisher::new(hub_tx.clone())),
        &settings,
    );
    tracing::info!(
        hosted = ?hosted,
        staging = %ctx.staging_location,
        "locsync daemon starting"
    );

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let hosted = hosted.clone();
        let stats = stats.clone();
        tokio::spawn(async move {
            let result = processor_task(ctx, hosted, stats, hub_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let hosted = hosted.clone();
        let stats = stats.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                hosted,
                stats,
                hub_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (processor_result, socket_result, signal_result) =
        tokio::join!(processor_handle, socket_handle, signal_handle);

    handle_join("processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("locsync daemon stopped");
    Ok(())
}

/// Take messages off the hub queue one at a time and run the phase each
/// one asks of the hosted locations.
///
/// A failed dispatch is logged and counted; it never stops the loop.
async fn processor_task(
    ctx: SyncContext,
    hosted: Arc<Vec<LocationName>>,
    stats: Arc<RwLock<DaemonStats>>,
    mut hub_rx: mpsc::UnboundedReceiver<HubMessage>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_message = hub_rx.recv() => {
                let Some(message) = maybe_message else { break };
                let identifier = message.action_identifier().to_string();

                let ctx = ctx.clone();
                let hosted = hosted.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    pipeline::dispatch(&ctx, &message, &hosted)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("dispatch task join error: {err}")))?;

                match &outcome {
                    Ok(Some(Dispatched::Push(report))) => tracing::info!(
                        action = %identifier,
                        job = %report.run.job_id,
                        transferred = report.run.transferred(),
                        skipped = report.run.skipped(),
                        failed = report.run.failed(),
                        "push finished",
                    ),
                    Ok(Some(Dispatched::Pull(report))) => tracing::info!(
                        action = %identifier,
                        job = %report.job_id,
                        status = ?report.status,
                        transferred = report.transferred(),
                        failed = report.failed(),
                        "pull finished",
                    ),
                    Ok(None) => tracing::debug!(action = %identifier, "message not hosted here"),
                    Err(err) => tracing::error!(action = %identifier, error = %err, "dispatch failed"),
                }

                stats.write().await.record(&outcome, unix_seconds_now());
            }
        }
    }

    Ok(())
}

async fn socket_server_task(
    home: PathBuf,
    hosted: Arc<Vec<LocationName>>,
    stats: Arc<RwLock<DaemonStats>>,
    hub_tx: mpsc::UnboundedSender<HubMessage>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "listening");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let client = SocketClient {
                    home: home.clone(),
                    hosted: hosted.clone(),
                    stats: stats.clone(),
                    hub_tx: hub_tx.clone(),
                    shutdown_tx: shutdown_tx.clone(),
                    started_at_unix,
                };
                tokio::spawn(async move {
                    if let Err(err) = client.serve(stream).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

/// Shared state one socket connection needs.
struct SocketClient {
    home: PathBuf,
    hosted: Arc<Vec<LocationName>>,
    stats: Arc<RwLock<DaemonStats>>,
    hub_tx: mpsc::UnboundedSender<HubMessage>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
}

impl SocketClient {
    async fn serve(self, stream: UnixStream) -> Result<(), DaemonError> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| io_err("daemon socket read", e))?
        {
            if line.trim().is_empty() {
                continue;
            }

            let request = match serde_json::from_str::<DaemonRequest>(&line) {
                Ok(request) => request,
                Err(err) => {
                    write_response(
                        &mut writer,
                        &DaemonResponse::error(format!("invalid request JSON: {err}")),
                    )
                    .await?;
                    continue;
                }
            };

            let stop = request.cmd == CMD_STOP;
            let response = self.handle(request).await;
            write_response(&mut writer, &response).await?;
            if stop {
                break;
            }
        }

        Ok(())
    }

    async fn handle(&self, request: DaemonRequest) -> DaemonResponse {
        let DaemonRequest { cmd, launch } = request;
        match cmd.as_str() {
            CMD_STATUS => DaemonResponse::ok(
                build_status_payload(
                    &self.home,
                    &self.hosted,
                    &self.stats,
                    self.started_at_unix,
                )
                .await,
            ),
            CMD_LAUNCH => match launch {
                Some(event) if event.topic == LAUNCH_TOPIC => {
                    tracing::info!(
                        action = %event.data.action_identifier,
                        user = %event.source.user,
                        versions = event.data.selection.len(),
                        "launch queued",
                    );
                    match self.hub_tx.send(HubMessage::Launch(event)) {
                        Ok(()) => DaemonResponse::ok(json!(ActionResponse::launched())),
                        Err(_) => {
                            DaemonResponse::error(DaemonError::ChannelClosed("hub queue").to_string())
                        }
                    }
                }
                Some(event) => {
                    DaemonResponse::error(format!("unexpected launch topic '{}'", event.topic))
                }
                None => DaemonResponse::error("launch request carries no event"),
            },
            CMD_STOP => {
                let _ = self.shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        }
    }
}

async fn build_status_payload(
    home: &Path,
    hosted: &[LocationName],
    stats: &RwLock<DaemonStats>,
    started_at_unix: u64,
) -> Value {
    let snapshot = stats.read().await.clone();

    let jobs_home = home.to_path_buf();
    let recent_jobs: Vec<Value> =
        match tokio::task::spawn_blocking(move || job_store::list_at(&jobs_home)).await {
            Ok(Ok(jobs)) => jobs.iter().take(RECENT_JOBS).map(|job| json!(job)).collect(),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "could not list jobs for status");
                vec![]
            }
            Err(err) => {
                tracing::warn!(error = %err, "job listing task failed");
                vec![]
            }
        };

    json!({
        "running": true,
        "pid": std::process::id(),
        "started_at_unix": started_at_unix,
        "hosted": hosted,
        "stats": snapshot,
        "recent_jobs": recent_jobs,
        "socket": socket_path(home).display().to_string(),
    })
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    for dir in [root_at(home), run_dir(home)] {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let mut payload = serde_json::to_string(response)?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
