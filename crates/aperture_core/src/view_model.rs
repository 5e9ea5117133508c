use crate::{ActiveView, BackendStatus, JobStatus, LogConnectionState, SearchHit};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub active_view: ActiveView,
    pub backend: BackendStatus,
    pub log: LogView,
    pub search: SearchView,
    pub jobs: JobBoardView,
    pub ingest: IngestView,
    pub shutting_down: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogView {
    pub state: LogConnectionState,
    pub retries: u32,
    pub connections: u64,
    pub last_disconnect: Option<String>,
    /// Most recent lines, oldest first.
    pub lines: Vec<String>,
    /// Lines received since start-up, including those evicted from `lines`.
    pub total_lines: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchView {
    #[default]
    Idle,
    Searching {
        query: String,
    },
    Results(Vec<SearchHit>),
    NoResults,
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobBoardView {
    pub loading: bool,
    pub error: Option<String>,
    pub columns: Vec<JobColumnView>,
}

impl JobBoardView {
    pub fn column(&self, status: JobStatus) -> Option<&JobColumnView> {
        self.columns.iter().find(|column| column.status == status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobColumnView {
    pub status: JobStatus,
    pub cards: Vec<JobCardView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardView {
    pub id: String,
    pub company: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestView {
    pub enabled: bool,
    pub notice: Option<String>,
}
