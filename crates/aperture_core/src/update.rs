use crate::state::{ActiveView, AppState, BackendStatus};
use crate::{Effect, Msg, Timer};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.shutting_down && starts_work(&msg) {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Started => {
            if state.backend != BackendStatus::NotStarted {
                return (state, Vec::new());
            }
            state.set_backend(BackendStatus::Starting);
            let mut effects = vec![Effect::StartBackend];
            if state.log.begin_connect() {
                effects.push(Effect::ConnectLog);
            }
            effects
        }
        Msg::QueryChanged(raw) => query_changed(&mut state, &raw),
        Msg::SearchViewOpened => {
            state.show(ActiveView::Search);
            Vec::new()
        }
        Msg::JobsViewOpened => {
            state.show(ActiveView::Jobs);
            state.jobs.begin_fetch();
            state.mark_dirty();
            vec![Effect::FetchJobs]
        }
        Msg::IngestClicked => {
            if !state.ingest.click() {
                return (state, Vec::new());
            }
            state.mark_dirty();
            let generation = state.timers.bump(Timer::IngestSettle);
            vec![
                Effect::TriggerIngest,
                Effect::StartTimer {
                    timer: Timer::IngestSettle,
                    generation,
                    delay: state.settings.ingest_settle,
                },
            ]
        }
        Msg::ShutdownRequested => {
            state.shutting_down = true;
            state.mark_dirty();
            vec![
                Effect::CancelTimer {
                    timer: Timer::SearchDebounce,
                },
                Effect::CancelTimer {
                    timer: Timer::LogReconnect,
                },
                Effect::CancelTimer {
                    timer: Timer::IngestSettle,
                },
                Effect::StopBackend,
            ]
        }
        Msg::TimerElapsed { timer, generation } => {
            if !state.timers.is_current(timer, generation) {
                return (state, Vec::new());
            }
            timer_elapsed(&mut state, timer)
        }
        Msg::BackendStarted { pid } => {
            state.set_backend(BackendStatus::Running { pid, ready: false });
            Vec::new()
        }
        Msg::BackendReady => {
            if let BackendStatus::Running { pid, ready: false } = state.backend {
                state.set_backend(BackendStatus::Running { pid, ready: true });
            }
            Vec::new()
        }
        Msg::BackendSpawnFailed { message } => {
            state.set_backend(BackendStatus::SpawnFailed { message });
            Vec::new()
        }
        Msg::BackendExited { code, requested } => {
            state.set_backend(BackendStatus::Exited { code, requested });
            Vec::new()
        }
        Msg::LogConnected => {
            if state.log.connected() {
                state.jobs.begin_fetch();
                state.mark_dirty();
                // Proactive sync: one board refresh per successful connection.
                vec![Effect::FetchJobs]
            } else {
                Vec::new()
            }
        }
        Msg::LogLine(line) => {
            state.log.push_line(line);
            state.mark_dirty();
            Vec::new()
        }
        Msg::LogDisconnected { reason } => {
            if !state.log.disconnected(reason) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            if state.shutting_down {
                return (state, Vec::new());
            }
            let generation = state.timers.bump(Timer::LogReconnect);
            vec![Effect::StartTimer {
                timer: Timer::LogReconnect,
                generation,
                delay: state.settings.reconnect_delay,
            }]
        }
        Msg::SearchCompleted { seq, result } => {
            if state.search.resolve(seq, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobsFetched(result) => {
            state.jobs.apply(result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::IngestTriggered(result) => {
            state.ingest.record_outcome(result);
            state.mark_dirty();
            Vec::new()
        }
    };

    (state, effects)
}

/// Messages that would start new work; they are dropped once shutdown began.
fn starts_work(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::Started
            | Msg::QueryChanged(_)
            | Msg::JobsViewOpened
            | Msg::IngestClicked
            | Msg::ShutdownRequested
            | Msg::TimerElapsed { .. }
            | Msg::LogConnected
    )
}

fn query_changed(state: &mut AppState, raw: &str) -> Vec<Effect> {
    let query = raw.trim();
    // Invalidate any scheduled search; a stale expiry must not fire.
    let generation = state.timers.bump(Timer::SearchDebounce);

    if query.chars().count() < state.settings.min_query_chars {
        if state.search.clear() {
            state.mark_dirty();
        }
        return vec![Effect::CancelTimer {
            timer: Timer::SearchDebounce,
        }];
    }

    state.search.set_pending(query.to_string());
    vec![Effect::StartTimer {
        timer: Timer::SearchDebounce,
        generation,
        delay: state.settings.search_debounce,
    }]
}

fn timer_elapsed(state: &mut AppState, timer: Timer) -> Vec<Effect> {
    match timer {
        Timer::SearchDebounce => match state.search.issue() {
            Some(request) => {
                state.mark_dirty();
                vec![Effect::IssueSearch {
                    seq: request.seq,
                    query: request.query,
                }]
            }
            None => Vec::new(),
        },
        Timer::LogReconnect => {
            if state.log.begin_connect() {
                state.mark_dirty();
                vec![Effect::ConnectLog]
            } else {
                Vec::new()
            }
        }
        Timer::IngestSettle => {
            // Re-enabled regardless of what the backend did with the request.
            state.ingest.settle();
            state.jobs.begin_fetch();
            state.mark_dirty();
            vec![Effect::FetchJobs]
        }
    }
}
