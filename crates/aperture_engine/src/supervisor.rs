//! Owns the backend server process: spawn, output forwarding, exit
//! tracking and graceful termination.
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aperture_logging::{shell_debug, shell_error, shell_info, shell_warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_APP_TARGET: &str = "backend.main:app";

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Everything needed to launch the ASGI server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub interpreter: PathBuf,
    /// Working directory; the app target is imported relative to it.
    pub app_root: PathBuf,
    pub app_target: String,
    pub host: String,
    pub port: u16,
    pub env_overrides: Vec<(String, String)>,
}

impl BackendSettings {
    pub fn new(interpreter: impl Into<PathBuf>, app_root: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            app_root: app_root.into(),
            app_target: DEFAULT_APP_TARGET.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            env_overrides: vec![
                ("PYTHONWARNINGS".to_string(), "ignore".to_string()),
                ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
            ],
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            "uvicorn".to_string(),
            self.app_target.clone(),
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    NotStarted,
    Running,
    Exited,
}

/// Snapshot of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendProcessHandle {
    pub state: ProcessState,
    pub pid: Option<u32>,
    pub last_exit_code: Option<i32>,
    /// Set once a termination signal was sent for the current process.
    pub stop_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives the backend's output lines and its exit.
pub trait BackendObserver: Send + Sync {
    fn line(&self, stream: OutputStream, line: &str);
    fn exited(&self, code: Option<i32>, requested: bool);
}

/// Forwards one line of backend output to the host log. Stderr lines that
/// look like failures are raised to error level; uvicorn writes its normal
/// access log to stderr as well.
pub fn log_backend_line(stream: OutputStream, line: &str) {
    match stream {
        OutputStream::Stdout => shell_info!("[Backend] {}", line),
        OutputStream::Stderr if looks_like_error(line) => shell_error!("[Backend Error] {}", line),
        OutputStream::Stderr => shell_info!("[Backend] {}", line),
    }
}

fn looks_like_error(line: &str) -> bool {
    ["ERROR", "Traceback", "Exception"]
        .iter()
        .any(|marker| line.contains(marker))
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("interpreter not found: {interpreter}")]
    InterpreterNotFound {
        interpreter: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn backend: {0}")]
    Spawn(#[from] io::Error),
}

pub struct BackendSupervisor {
    settings: BackendSettings,
    observer: Arc<dyn BackendObserver>,
    handle: Arc<Mutex<BackendProcessHandle>>,
}

impl BackendSupervisor {
    pub fn new(settings: BackendSettings, observer: Arc<dyn BackendObserver>) -> Self {
        Self {
            settings,
            observer,
            handle: Arc::new(Mutex::new(BackendProcessHandle::default())),
        }
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    pub fn handle(&self) -> BackendProcessHandle {
        *lock(&self.handle)
    }

    pub fn is_running(&self) -> bool {
        self.handle().state == ProcessState::Running
    }

    /// Spawns the server. Idempotent while a process is running: the live pid
    /// is returned and nothing new is spawned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<u32, SupervisorError> {
        let mut handle = lock(&self.handle);
        if let (ProcessState::Running, Some(pid)) = (handle.state, handle.pid) {
            shell_debug!("[Backend] Already running (PID: {})", pid);
            return Ok(pid);
        }

        let args = self.settings.args();
        shell_info!(
            "[Backend] Starting {} {} in {}",
            self.settings.interpreter.display(),
            args.join(" "),
            self.settings.app_root.display()
        );

        let mut command = Command::new(&self.settings.interpreter);
        command
            .args(&args)
            .current_dir(&self.settings.app_root)
            .envs(
                self.settings
                    .env_overrides
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(target_os = "windows")]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|err| {
            let err = self.classify_spawn_error(err);
            shell_error!("[Backend] {}", err);
            err
        })?;
        let pid = child.id().unwrap_or_default();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(
                stdout,
                OutputStream::Stdout,
                Arc::clone(&self.observer),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(
                stderr,
                OutputStream::Stderr,
                Arc::clone(&self.observer),
            ));
        }

        handle.state = ProcessState::Running;
        handle.pid = Some(pid);
        handle.stop_requested = false;
        drop(handle);

        let shared = Arc::clone(&self.handle);
        let observer = Arc::clone(&self.observer);
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    shell_warn!("[Backend] Failed to wait for PID {}: {}", pid, err);
                    None
                }
            };
            let requested = {
                let mut handle = lock(&shared);
                handle.state = ProcessState::Exited;
                handle.last_exit_code = code;
                handle.stop_requested
            };
            if requested {
                shell_info!("[Backend] Stopped (exit code {:?})", code);
            } else {
                shell_warn!("[Backend] Exited unexpectedly (exit code {:?})", code);
            }
            observer.exited(code, requested);
        });

        shell_info!("[Backend] Started (PID: {})", pid);
        Ok(pid)
    }

    /// Asks the running process to terminate. Returns `false` when there was
    /// nothing to stop or a request was already sent.
    pub fn stop(&mut self) -> bool {
        let mut handle = lock(&self.handle);
        match (handle.state, handle.pid) {
            (ProcessState::Running, Some(pid)) if !handle.stop_requested => {
                shell_info!("[Backend] Requesting shutdown (PID: {})", pid);
                handle.stop_requested = true;
                request_termination(pid);
                true
            }
            _ => {
                shell_debug!("[Backend] Nothing to stop");
                false
            }
        }
    }

    fn classify_spawn_error(&self, err: io::Error) -> SupervisorError {
        if matches!(
            err.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
        ) {
            SupervisorError::InterpreterNotFound {
                interpreter: self.settings.interpreter.display().to_string(),
                source: err,
            }
        } else {
            SupervisorError::Spawn(err)
        }
    }
}

impl Drop for BackendSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn forward_lines<R>(reader: R, stream: OutputStream, observer: Arc<dyn BackendObserver>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buffer);
                let line = text.trim_end();
                if !line.is_empty() {
                    observer.line(stream, line);
                }
            }
            Err(err) => {
                shell_warn!("[Backend] Failed to read {:?}: {}", stream, err);
                break;
            }
        }
    }
}

/// SIGTERM on Unix so uvicorn runs its shutdown hooks; `taskkill` without
/// `/F` on Windows so the process tree gets a close request. The signaller
/// is spawned and never waited on here, so the caller's thread never blocks.
fn request_termination(pid: u32) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        // Outside a runtime (late drop): fire and forget.
        if let Err(err) = termination_command(pid).spawn() {
            shell_warn!("[Backend] Failed to signal PID {}: {}", pid, err);
        }
        return;
    };

    let mut signaller = match Command::from(termination_command(pid)).spawn() {
        Ok(child) => child,
        Err(err) => {
            shell_warn!("[Backend] Failed to signal PID {}: {}", pid, err);
            return;
        }
    };
    runtime.spawn(async move {
        match signaller.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                shell_warn!("[Backend] Termination request for PID {} returned {}", pid, status)
            }
            Err(err) => shell_warn!("[Backend] Failed to signal PID {}: {}", pid, err),
        }
    });
}

fn termination_command(pid: u32) -> std::process::Command {
    #[cfg(not(target_os = "windows"))]
    let mut command = {
        let mut command = std::process::Command::new("kill");
        command.args(["-TERM", &pid.to_string()]);
        command
    };

    #[cfg(target_os = "windows")]
    let mut command = {
        use std::os::windows::process::CommandExt;
        let mut command = std::process::Command::new("taskkill");
        command
            .args(["/pid", &pid.to_string(), "/T"])
            .creation_flags(CREATE_NO_WINDOW);
        command
    };

    command.stdout(Stdio::null()).stderr(Stdio::null());
    command
}
