use aperture_core::{
    ActiveView, AppViewModel, BackendStatus, IngestView, JobBoardView, LogConnectionState, LogView,
    SearchView,
};

/// Turns successive view models into terminal lines, printing only what changed.
#[derive(Debug, Default)]
pub(crate) struct Renderer {
    backend: Option<BackendStatus>,
    log_state: Option<(LogConnectionState, u32)>,
    printed_lines: u64,
    active_view: Option<ActiveView>,
    search: Option<SearchView>,
    jobs: Option<JobBoardView>,
    ingest: Option<IngestView>,
    shutting_down: bool,
}

impl Renderer {
    pub(crate) fn render(&mut self, view: &AppViewModel, stamp: &str) -> Vec<String> {
        let mut out = Vec::new();

        if self.backend.as_ref() != Some(&view.backend) {
            out.push(format!("[{stamp}] backend: {}", backend_label(&view.backend)));
            self.backend = Some(view.backend.clone());
        }

        let log_state = (view.log.state, view.log.retries);
        if self.log_state != Some(log_state) {
            out.push(format!("[{stamp}] log stream: {}", log_label(&view.log)));
            self.log_state = Some(log_state);
        }
        self.render_log_lines(&view.log, &mut out);

        let view_changed = self.active_view != Some(view.active_view);
        if view_changed {
            let name = match view.active_view {
                ActiveView::Search => "search",
                ActiveView::Jobs => "jobs",
            };
            out.push(format!("[{stamp}] view: {name}"));
            self.active_view = Some(view.active_view);
        }

        match view.active_view {
            ActiveView::Search => {
                if view_changed || self.search.as_ref() != Some(&view.search) {
                    render_search(&view.search, &mut out);
                }
            }
            ActiveView::Jobs => {
                if view_changed || self.jobs.as_ref() != Some(&view.jobs) {
                    render_jobs(&view.jobs, &mut out);
                }
            }
        }
        self.search = Some(view.search.clone());
        self.jobs = Some(view.jobs.clone());

        if self.ingest.as_ref() != Some(&view.ingest) {
            if let Some(notice) = &view.ingest.notice {
                let control = if view.ingest.enabled {
                    "available"
                } else {
                    "disabled"
                };
                out.push(format!("[{stamp}] ingest: {notice} (control {control})"));
            }
            self.ingest = Some(view.ingest.clone());
        }

        if view.shutting_down && !self.shutting_down {
            out.push(format!("[{stamp}] shutting down"));
            self.shutting_down = true;
        }

        out
    }

    /// Prints lines received since the previous render; evicted ones are skipped.
    fn render_log_lines(&mut self, log: &LogView, out: &mut Vec<String>) {
        let fresh = log.total_lines.saturating_sub(self.printed_lines);
        let available = u64::try_from(log.lines.len()).unwrap_or(u64::MAX);
        let skip = available.saturating_sub(fresh);
        out.extend(
            log.lines
                .iter()
                .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                .map(|line| format!("  | {line}")),
        );
        self.printed_lines = log.total_lines;
    }
}

fn backend_label(status: &BackendStatus) -> String {
    match status {
        BackendStatus::NotStarted => "not started".to_string(),
        BackendStatus::Starting => "starting".to_string(),
        BackendStatus::Running { pid, ready: false } => format!("running (pid {pid})"),
        BackendStatus::Running { pid, ready: true } => format!("ready (pid {pid})"),
        BackendStatus::SpawnFailed { message } => format!("failed to start: {message}"),
        BackendStatus::Exited {
            code,
            requested: true,
        } => format!("stopped (exit code {})", exit_code(*code)),
        BackendStatus::Exited {
            code,
            requested: false,
        } => format!("exited unexpectedly (exit code {})", exit_code(*code)),
    }
}

fn exit_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |code| code.to_string())
}

fn log_label(log: &LogView) -> String {
    match log.state {
        LogConnectionState::Connecting => "connecting".to_string(),
        LogConnectionState::Connected => "connected".to_string(),
        LogConnectionState::Disconnected => match &log.last_disconnect {
            Some(reason) => format!("disconnected ({reason}), retry #{}", log.retries),
            None => "disconnected".to_string(),
        },
    }
}

fn render_search(search: &SearchView, out: &mut Vec<String>) {
    match search {
        SearchView::Idle => out.push("search: type at least a few characters".to_string()),
        SearchView::Searching { query } => out.push(format!("search: searching for {query:?}")),
        SearchView::NoResults => out.push("search: no results".to_string()),
        SearchView::Failed { message } => out.push(format!("search: error: {message}")),
        SearchView::Results(hits) => {
            out.push(format!("search: {} result(s)", hits.len()));
            for (index, hit) in hits.iter().enumerate() {
                let attachment = if hit.has_attachment {
                    " [attachment]"
                } else {
                    ""
                };
                out.push(format!(
                    "  {}. {} | {} | {} ({:.2}){}",
                    index + 1,
                    hit.subject,
                    hit.sender,
                    hit.category,
                    hit.relevance_score,
                    attachment
                ));
                if !hit.preview.is_empty() {
                    out.push(format!("     {}", hit.preview));
                }
            }
        }
    }
}

fn render_jobs(jobs: &JobBoardView, out: &mut Vec<String>) {
    if jobs.loading {
        out.push("jobs: loading".to_string());
    }
    if let Some(error) = &jobs.error {
        out.push(format!("jobs: error: {error}"));
    }
    for column in &jobs.columns {
        out.push(format!("{} ({})", column.status.label(), column.cards.len()));
        for card in &column.cards {
            out.push(format!("  - {}: {}", card.company, card.subject));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_core::{
        update, AppState, FetchFailure, JobRecord, JobStatus, JobsPayload, Msg, SearchHit,
        SearchPayload, Timer,
    };
    use pretty_assertions::assert_eq;

    fn drive(state: AppState, msgs: Vec<Msg>) -> AppState {
        msgs.into_iter().fold(state, |state, msg| update(state, msg).0)
    }

    #[test]
    fn invoice_search_renders_one_result_with_attachment() {
        let state = drive(
            AppState::new(),
            vec![
                Msg::QueryChanged("invoice".to_string()),
                Msg::TimerElapsed {
                    timer: Timer::SearchDebounce,
                    generation: 1,
                },
                Msg::SearchCompleted {
                    seq: 1,
                    result: Ok(SearchPayload {
                        status: "success".to_string(),
                        hits: vec![SearchHit {
                            id: "m-1".to_string(),
                            sender: "billing@x.com".to_string(),
                            subject: "Invoice #12".to_string(),
                            preview: "...".to_string(),
                            relevance_score: 0.92,
                            category: "Finance".to_string(),
                            has_attachment: true,
                        }],
                    }),
                },
            ],
        );

        let lines = Renderer::default().render(&state.view(), "10:00:00");
        let results: Vec<_> = lines.iter().filter(|line| line.starts_with("  1.")).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].contains("Invoice #12"));
        assert!(results[0].ends_with("[attachment]"));
        assert!(!lines.iter().any(|line| line.starts_with("  2.")));
    }

    #[test]
    fn unchanged_view_renders_nothing() {
        let mut renderer = Renderer::default();
        let view = AppState::new().view();
        assert!(!renderer.render(&view, "t").is_empty());
        assert!(renderer.render(&view, "t").is_empty());
    }

    #[test]
    fn log_lines_are_printed_once() {
        let mut renderer = Renderer::default();
        let state = drive(
            AppState::new(),
            vec![
                Msg::Started,
                Msg::LogConnected,
                Msg::LogLine("INFO one".to_string()),
            ],
        );
        let first = renderer.render(&state.view(), "t");
        assert!(first.contains(&"  | INFO one".to_string()));

        let state = drive(state, vec![Msg::LogLine("INFO two".to_string())]);
        let second = renderer.render(&state.view(), "t");
        assert_eq!(second, vec!["  | INFO two".to_string()]);
    }

    #[test]
    fn job_board_lists_columns_and_unknown_company() {
        let state = drive(
            AppState::new(),
            vec![
                Msg::JobsViewOpened,
                Msg::JobsFetched(Ok(JobsPayload {
                    status: "success".to_string(),
                    jobs: vec![JobRecord {
                        id: "1".to_string(),
                        sender: "jobs@corp.test".to_string(),
                        company: None,
                        subject: "Application received".to_string(),
                        status: JobStatus::Applied,
                    }],
                })),
            ],
        );

        let lines = Renderer::default().render(&state.view(), "t");
        assert!(lines.contains(&"Applied (1)".to_string()));
        assert!(lines.contains(&"  - Unknown: Application received".to_string()));
        assert!(lines.contains(&"Rejected (0)".to_string()));
    }

    #[test]
    fn job_fetch_error_is_shown_inline() {
        let state = drive(
            AppState::new(),
            vec![
                Msg::JobsViewOpened,
                Msg::JobsFetched(Err(FetchFailure::Unreachable("refused".to_string()))),
            ],
        );
        let lines = Renderer::default().render(&state.view(), "t");
        assert!(lines
            .iter()
            .any(|line| line.starts_with("jobs: error: backend unreachable")));
    }
}
