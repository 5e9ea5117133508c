use crate::{FetchFailure, JobsPayload, SearchPayload, SearchSeq, Timer};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Host finished start-up; spawn the backend and open the log stream.
    Started,
    /// User edited the search box; carries the full box content.
    QueryChanged(String),
    /// User navigated to the search view.
    SearchViewOpened,
    /// User navigated to the job board.
    JobsViewOpened,
    /// User clicked the ingest control.
    IngestClicked,
    /// Host is shutting down.
    ShutdownRequested,
    /// A scheduled timer fired.
    TimerElapsed { timer: Timer, generation: u64 },
    BackendStarted { pid: u32 },
    /// Backend answered its health endpoint.
    BackendReady,
    BackendSpawnFailed { message: String },
    BackendExited { code: Option<i32>, requested: bool },
    LogConnected,
    LogLine(String),
    LogDisconnected { reason: String },
    SearchCompleted {
        seq: SearchSeq,
        result: Result<SearchPayload, FetchFailure>,
    },
    JobsFetched(Result<JobsPayload, FetchFailure>),
    IngestTriggered(Result<(), FetchFailure>),
}
