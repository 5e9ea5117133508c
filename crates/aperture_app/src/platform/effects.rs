use std::sync::mpsc;

use aperture_core::{
    Effect, FetchFailure, JobRecord, JobStatus, JobsPayload, Msg, SearchHit, SearchPayload, Timer,
};
use aperture_engine::{
    ClientError, ClientErrorKind, EngineEvent, EngineHandle, EventSink, JobsResponse,
    SearchResponse, TimerKind,
};
use aperture_logging::shell_debug;

/// Hands effects produced by `update` to the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            shell_debug!("effect {:?}", effect);
            match effect {
                Effect::StartBackend => self.engine.start_backend(),
                Effect::StopBackend => self.engine.stop_backend(),
                Effect::ConnectLog => self.engine.connect_log(),
                Effect::StartTimer {
                    timer,
                    generation,
                    delay,
                } => self.engine.start_timer(to_engine_timer(timer), generation, delay),
                Effect::CancelTimer { timer } => self.engine.cancel_timer(to_engine_timer(timer)),
                Effect::IssueSearch { seq, query } => self.engine.search(seq, query),
                Effect::FetchJobs => self.engine.fetch_jobs(),
                Effect::TriggerIngest => self.engine.trigger_ingest(),
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}

/// Engine sink that turns events into core messages for the update loop.
pub struct MsgForwarder {
    tx: mpsc::Sender<Msg>,
}

impl MsgForwarder {
    pub fn new(tx: mpsc::Sender<Msg>) -> Self {
        Self { tx }
    }
}

impl EventSink for MsgForwarder {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(map_event(event));
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::BackendStarted { pid } => Msg::BackendStarted { pid },
        EngineEvent::BackendSpawnFailed { message } => Msg::BackendSpawnFailed { message },
        EngineEvent::BackendReady => Msg::BackendReady,
        EngineEvent::BackendExited { code, requested } => Msg::BackendExited { code, requested },
        EngineEvent::LogConnected => Msg::LogConnected,
        EngineEvent::LogLine(line) => Msg::LogLine(line),
        EngineEvent::LogDisconnected { reason } => Msg::LogDisconnected { reason },
        EngineEvent::SearchCompleted { seq, result } => Msg::SearchCompleted {
            seq,
            result: result.map(map_search).map_err(map_failure),
        },
        EngineEvent::JobsFetched(result) => {
            Msg::JobsFetched(result.map(map_jobs).map_err(map_failure))
        }
        EngineEvent::IngestFinished(result) => Msg::IngestTriggered(result.map_err(map_failure)),
        EngineEvent::TimerFired { timer, generation } => Msg::TimerElapsed {
            timer: to_core_timer(timer),
            generation,
        },
        EngineEvent::InterruptRequested => Msg::ShutdownRequested,
    }
}

fn to_engine_timer(timer: Timer) -> TimerKind {
    match timer {
        Timer::SearchDebounce => TimerKind::SearchDebounce,
        Timer::LogReconnect => TimerKind::LogReconnect,
        Timer::IngestSettle => TimerKind::IngestSettle,
    }
}

fn to_core_timer(timer: TimerKind) -> Timer {
    match timer {
        TimerKind::SearchDebounce => Timer::SearchDebounce,
        TimerKind::LogReconnect => Timer::LogReconnect,
        TimerKind::IngestSettle => Timer::IngestSettle,
    }
}

fn map_failure(err: ClientError) -> FetchFailure {
    match err.kind {
        ClientErrorKind::HttpStatus(code) => FetchFailure::HttpStatus(code),
        ClientErrorKind::Timeout => FetchFailure::Timeout,
        ClientErrorKind::Malformed => FetchFailure::Malformed(err.message),
        ClientErrorKind::Unreachable | ClientErrorKind::InvalidUrl => {
            FetchFailure::Unreachable(err.message)
        }
    }
}

fn map_search(response: SearchResponse) -> SearchPayload {
    SearchPayload {
        status: response.status,
        hits: response
            .results
            .into_iter()
            .map(|item| SearchHit {
                id: item.id,
                sender: item.sender,
                subject: item.subject,
                preview: item.preview,
                relevance_score: item.relevance_score,
                category: item.category,
                has_attachment: item.has_attachment,
            })
            .collect(),
    }
}

fn map_jobs(response: JobsResponse) -> JobsPayload {
    JobsPayload {
        status: response.status,
        jobs: response
            .results
            .into_iter()
            .map(|item| JobRecord {
                status: JobStatus::from_label(item.status.as_deref()),
                id: item.id,
                sender: item.sender,
                company: item.company,
                subject: item.subject,
            })
            .collect(),
    }
}
