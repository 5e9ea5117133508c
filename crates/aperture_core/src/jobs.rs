use crate::{FetchFailure, SUCCESS_STATUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    /// Board columns, left to right.
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    /// Maps a backend label onto a column. Missing or unknown labels land in `Applied`.
    pub fn from_label(label: Option<&str>) -> JobStatus {
        let Some(label) = label.map(str::trim) else {
            return JobStatus::Applied;
        };
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: String,
    pub sender: String,
    pub company: Option<String>,
    pub subject: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsPayload {
    pub status: String,
    pub jobs: Vec<JobRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct JobBoard {
    records: Vec<JobRecord>,
    loading: bool,
    error: Option<FetchFailure>,
}

impl JobBoard {
    pub(crate) fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.loading = true;
    }

    /// Transport failures keep the last good board and surface the error inline.
    pub(crate) fn apply(&mut self, result: Result<JobsPayload, FetchFailure>) {
        self.loading = false;
        match result {
            Ok(payload) if payload.status == SUCCESS_STATUS => {
                self.records = payload.jobs;
                self.error = None;
            }
            Ok(_) => {
                self.records.clear();
                self.error = None;
            }
            Err(failure) if failure.is_malformed() => {
                self.records.clear();
                self.error = None;
            }
            Err(failure) => {
                self.error = Some(failure);
            }
        }
    }
}

/// The manual ingestion control: disabled from click until the settle timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestControl {
    enabled: bool,
    notice: Option<String>,
}

impl Default for IngestControl {
    fn default() -> Self {
        Self {
            enabled: true,
            notice: None,
        }
    }
}

impl IngestControl {
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Returns `false` when the click must be ignored.
    pub(crate) fn click(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        self.notice = Some("Ingestion requested".to_string());
        true
    }

    pub(crate) fn record_outcome(&mut self, result: Result<(), FetchFailure>) {
        self.notice = Some(match result {
            Ok(()) => "Ingestion started in the background".to_string(),
            Err(failure) => format!("Ingestion request failed: {failure}"),
        });
    }

    pub(crate) fn settle(&mut self) {
        self.enabled = true;
    }
}
