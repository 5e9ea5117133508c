use crate::jobs::{IngestControl, JobBoard};
use crate::log_link::LogLink;
use crate::search::{SearchPhase, SearchState};
use crate::view_model::{
    AppViewModel, IngestView, JobBoardView, JobCardView, JobColumnView, LogView, SearchView,
};
use crate::{CoreSettings, JobStatus, Timer};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    NotStarted,
    Starting,
    Running {
        pid: u32,
        ready: bool,
    },
    SpawnFailed {
        message: String,
    },
    Exited {
        code: Option<i32>,
        requested: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Search,
    Jobs,
}

/// Current generation per timer kind; an expiry for any other generation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TimerGenerations {
    search_debounce: u64,
    log_reconnect: u64,
    ingest_settle: u64,
}

impl TimerGenerations {
    fn slot(&mut self, timer: Timer) -> &mut u64 {
        match timer {
            Timer::SearchDebounce => &mut self.search_debounce,
            Timer::LogReconnect => &mut self.log_reconnect,
            Timer::IngestSettle => &mut self.ingest_settle,
        }
    }

    pub(crate) fn bump(&mut self, timer: Timer) -> u64 {
        let slot = self.slot(timer);
        *slot += 1;
        *slot
    }

    pub(crate) fn is_current(&self, timer: Timer, generation: u64) -> bool {
        let current = match timer {
            Timer::SearchDebounce => self.search_debounce,
            Timer::LogReconnect => self.log_reconnect,
            Timer::IngestSettle => self.ingest_settle,
        };
        current == generation
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) settings: CoreSettings,
    pub(crate) backend: BackendStatus,
    pub(crate) log: LogLink,
    pub(crate) search: SearchState,
    pub(crate) jobs: JobBoard,
    pub(crate) ingest: IngestControl,
    pub(crate) active_view: ActiveView,
    pub(crate) timers: TimerGenerations,
    pub(crate) shutting_down: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            active_view: self.active_view,
            backend: self.backend.clone(),
            log: LogView {
                state: self.log.state(),
                retries: self.log.retries(),
                connections: self.log.connections(),
                last_disconnect: self.log.last_disconnect().map(ToOwned::to_owned),
                lines: self.log.lines().cloned().collect(),
                total_lines: self.log.total_lines(),
            },
            search: self.search_view(),
            jobs: self.job_board_view(),
            ingest: IngestView {
                enabled: self.ingest.is_enabled(),
                notice: self.ingest.notice().map(ToOwned::to_owned),
            },
            shutting_down: self.shutting_down,
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_backend(&mut self, status: BackendStatus) {
        if self.backend != status {
            self.backend = status;
            self.mark_dirty();
        }
    }

    pub(crate) fn show(&mut self, view: ActiveView) {
        if self.active_view != view {
            self.active_view = view;
            self.mark_dirty();
        }
    }

    fn search_view(&self) -> SearchView {
        match self.search.phase() {
            SearchPhase::Idle => SearchView::Idle,
            SearchPhase::Searching { query } => SearchView::Searching {
                query: query.clone(),
            },
            SearchPhase::Results(hits) => SearchView::Results(hits.clone()),
            SearchPhase::NoResults => SearchView::NoResults,
            SearchPhase::Failed(failure) => SearchView::Failed {
                message: failure.to_string(),
            },
        }
    }

    fn job_board_view(&self) -> JobBoardView {
        let columns = JobStatus::ALL
            .into_iter()
            .map(|status| JobColumnView {
                status,
                cards: self
                    .jobs
                    .records()
                    .iter()
                    .filter(|record| record.status == status)
                    .map(|record| JobCardView {
                        id: record.id.clone(),
                        company: record
                            .company
                            .clone()
                            .filter(|company| !company.trim().is_empty())
                            .unwrap_or_else(|| "Unknown".to_string()),
                        subject: record.subject.clone(),
                    })
                    .collect(),
            })
            .collect();

        JobBoardView {
            loading: self.jobs.is_loading(),
            error: self.jobs.error().map(ToString::to_string),
            columns,
        }
    }
}
