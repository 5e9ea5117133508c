use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aperture_logging::{shell_debug, shell_error, shell_info, shell_warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::{BackendApi, ClientSettings, ReqwestBackendClient};
use crate::log_relay::LogRelay;
use crate::scheduler::Scheduler;
use crate::supervisor::{
    log_backend_line, BackendObserver, BackendSettings, BackendSupervisor, OutputStream,
};
use crate::{ClientError, EngineEvent, EventSink, TimerKind};

/// Health polling after a successful spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub client: ClientSettings,
    /// WebSocket endpoint streaming backend log lines.
    pub log_url: String,
    pub readiness: ReadinessSettings,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to build backend client: {0}")]
    Client(#[from] ClientError),
}

enum EngineCommand {
    StartBackend,
    StopBackend,
    ConnectLog,
    Search { seq: u64, query: String },
    FetchJobs,
    TriggerIngest,
    StartTimer {
        timer: TimerKind,
        generation: u64,
        delay: Duration,
    },
    CancelTimer { timer: TimerKind },
    Shutdown,
}

/// Owns the engine thread. Commands are queued; results come back through
/// the [`EventSink`] given at construction.
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let api = Arc::new(ReqwestBackendClient::new(&config.client)?);
        Self::with_api(config, api, sink)
    }

    /// Like [`EngineHandle::new`] with a caller-supplied API client.
    pub fn with_api(
        config: EngineConfig,
        api: Arc<dyn BackendApi>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let thread = thread::Builder::new()
            .name("aperture-engine".to_string())
            .spawn(move || {
                runtime.block_on(run(config, api, sink, cmd_rx));
            })?;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    pub fn start_backend(&self) {
        self.send(EngineCommand::StartBackend);
    }

    pub fn stop_backend(&self) {
        self.send(EngineCommand::StopBackend);
    }

    pub fn connect_log(&self) {
        self.send(EngineCommand::ConnectLog);
    }

    pub fn search(&self, seq: u64, query: impl Into<String>) {
        self.send(EngineCommand::Search {
            seq,
            query: query.into(),
        });
    }

    pub fn fetch_jobs(&self) {
        self.send(EngineCommand::FetchJobs);
    }

    pub fn trigger_ingest(&self) {
        self.send(EngineCommand::TriggerIngest);
    }

    pub fn start_timer(&self, timer: TimerKind, generation: u64, delay: Duration) {
        self.send(EngineCommand::StartTimer {
            timer,
            generation,
            delay,
        });
    }

    pub fn cancel_timer(&self, timer: TimerKind) {
        self.send(EngineCommand::CancelTimer { timer });
    }

    /// Stops timers, the log relay and the backend, then joins the engine thread.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.send(EngineCommand::Shutdown);
        if thread.join().is_err() {
            shell_error!("Engine thread panicked during shutdown");
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            shell_warn!("Engine is not running; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Forwards process output to the log and reports the exit as an event.
struct SinkObserver {
    sink: Arc<dyn EventSink>,
}

impl BackendObserver for SinkObserver {
    fn line(&self, stream: OutputStream, line: &str) {
        log_backend_line(stream, line);
    }

    fn exited(&self, code: Option<i32>, requested: bool) {
        self.sink.emit(EngineEvent::BackendExited { code, requested });
    }
}

async fn run(
    config: EngineConfig,
    api: Arc<dyn BackendApi>,
    sink: Arc<dyn EventSink>,
    mut cmd_rx: mpsc::UnboundedReceiver<EngineCommand>,
) {
    let observer = Arc::new(SinkObserver {
        sink: Arc::clone(&sink),
    });
    let mut supervisor = BackendSupervisor::new(config.backend, observer);
    let mut relay = LogRelay::new(config.log_url, Arc::clone(&sink))
        .with_connect_timeout(config.client.connect_timeout);
    let mut scheduler = Scheduler::new(Arc::clone(&sink));
    let readiness = CancellationToken::new();

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupt_armed = true;

    loop {
        let command = tokio::select! {
            command = cmd_rx.recv() => command,
            result = &mut interrupt, if interrupt_armed => {
                interrupt_armed = false;
                match result {
                    Ok(()) => {
                        shell_info!("Interrupt received");
                        sink.emit(EngineEvent::InterruptRequested);
                    }
                    Err(err) => shell_warn!("Cannot listen for Ctrl-C: {}", err),
                }
                continue;
            }
        };
        let Some(command) = command else {
            break;
        };

        match command {
            EngineCommand::StartBackend => {
                let was_running = supervisor.is_running();
                match supervisor.start() {
                    Ok(pid) => {
                        sink.emit(EngineEvent::BackendStarted { pid });
                        if !was_running {
                            tokio::spawn(await_readiness(
                                Arc::clone(&api),
                                config.readiness,
                                readiness.child_token(),
                                Arc::clone(&sink),
                            ));
                        }
                    }
                    Err(err) => sink.emit(EngineEvent::BackendSpawnFailed {
                        message: err.to_string(),
                    }),
                }
            }
            EngineCommand::StopBackend => {
                supervisor.stop();
            }
            EngineCommand::ConnectLog => {
                relay.connect();
            }
            EngineCommand::Search { seq, query } => {
                let api = Arc::clone(&api);
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    shell_debug!("Search #{} for {:?}", seq, query);
                    let result = api.search(&query).await;
                    if let Err(err) = &result {
                        shell_warn!("Search #{} failed: {}", seq, err);
                    }
                    sink.emit(EngineEvent::SearchCompleted { seq, result });
                });
            }
            EngineCommand::FetchJobs => {
                let api = Arc::clone(&api);
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let result = api.jobs().await;
                    if let Err(err) = &result {
                        shell_warn!("Fetching jobs failed: {}", err);
                    }
                    sink.emit(EngineEvent::JobsFetched(result));
                });
            }
            EngineCommand::TriggerIngest => {
                let api = Arc::clone(&api);
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let result = api.trigger_ingest().await;
                    match &result {
                        Ok(()) => shell_info!("Ingestion triggered"),
                        Err(err) => shell_error!("Ingestion trigger failed: {}", err),
                    }
                    sink.emit(EngineEvent::IngestFinished(result));
                });
            }
            EngineCommand::StartTimer {
                timer,
                generation,
                delay,
            } => scheduler.start(timer, generation, delay),
            EngineCommand::CancelTimer { timer } => scheduler.cancel(timer),
            EngineCommand::Shutdown => break,
        }
    }

    shell_info!("Engine shutting down");
    readiness.cancel();
    scheduler.cancel_all();
    relay.abort();
    supervisor.stop();
}

/// Polls the health route until it answers `ok`, the deadline passes, or
/// `cancel` fires.
async fn await_readiness(
    api: Arc<dyn BackendApi>,
    settings: ReadinessSettings,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    let deadline = Instant::now() + settings.timeout;
    loop {
        match api.health().await {
            Ok(health) if health.status == "ok" => {
                shell_info!("[Backend] Ready");
                sink.emit(EngineEvent::BackendReady);
                return;
            }
            Ok(health) => shell_debug!("[Backend] Health status {:?}", health.status),
            Err(err) => shell_debug!("[Backend] Not ready yet: {}", err),
        }
        if Instant::now() >= deadline {
            shell_warn!("[Backend] No healthy answer within {:?}", settings.timeout);
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(settings.poll_interval) => {}
        }
    }
}
