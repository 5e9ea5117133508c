//! Aperture engine: backend supervision, log relay, HTTP client and timers.
//!
//! Everything here runs on the single-threaded runtime owned by
//! [`EngineHandle`]; results are reported through an [`EventSink`].
mod client;
mod engine;
mod interpreter;
mod log_relay;
mod scheduler;
mod sink;
mod supervisor;
mod types;

pub use client::{BackendApi, ClientSettings, ReqwestBackendClient};
pub use engine::{EngineConfig, EngineError, EngineHandle, ReadinessSettings};
pub use interpreter::{
    resolve, resolve_from_env, venv_interpreter, InterpreterSource, ResolvedInterpreter,
    DEFAULT_INTERPRETER, OVERRIDE_ENV, VENV_ENV,
};
pub use log_relay::LogRelay;
pub use scheduler::Scheduler;
pub use sink::{ChannelEventSink, EventSink};
pub use supervisor::{
    log_backend_line, BackendObserver, BackendProcessHandle, BackendSettings, BackendSupervisor,
    OutputStream, ProcessState, SupervisorError, DEFAULT_APP_TARGET, DEFAULT_HOST, DEFAULT_PORT,
};
pub use types::{
    ClientError, ClientErrorKind, EngineEvent, HealthResponse, JobItem, JobsResponse,
    SearchResponse, SearchResultItem, TimerKind,
};
