//! Aperture core: pure state machine and view-model helpers for the desktop shell.
//!
//! Nothing in this crate performs I/O or reads a clock. Timers, sockets and
//! processes are requested through [`Effect`]s and reported back as [`Msg`]s.
mod effect;
mod failure;
mod jobs;
mod log_link;
mod msg;
mod search;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Timer};
pub use failure::FetchFailure;
pub use jobs::{JobRecord, JobStatus, JobsPayload};
pub use log_link::{LogConnectionState, LOG_BUFFER_LINES};
pub use msg::Msg;
pub use search::{SearchHit, SearchPayload, SearchSeq, SUCCESS_STATUS};
pub use settings::{CoreSettings, MIN_QUERY_CHARS};
pub use state::{ActiveView, AppState, BackendStatus};
pub use update::update;
pub use view_model::{
    AppViewModel, IngestView, JobBoardView, JobCardView, JobColumnView, LogView, SearchView,
};
