use std::sync::{mpsc, Arc};
use std::time::Duration;

use aperture_engine::{
    BackendApi, BackendSettings, ChannelEventSink, ClientError, ClientErrorKind, ClientSettings,
    EngineConfig, EngineEvent, EngineHandle, HealthResponse, JobsResponse, ReadinessSettings,
    SearchResponse, TimerKind,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;

struct FakeApi;

#[async_trait]
impl BackendApi for FakeApi {
    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        Ok(SearchResponse {
            status: format!("success:{query}"),
            results: Vec::new(),
        })
    }

    async fn jobs(&self) -> Result<JobsResponse, ClientError> {
        Err(ClientError {
            kind: ClientErrorKind::Unreachable,
            message: "connection refused".to_string(),
        })
    }

    async fn trigger_ingest(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        Ok(HealthResponse {
            status: "ok".to_string(),
            message: None,
        })
    }
}

fn engine() -> (EngineHandle, mpsc::Receiver<EngineEvent>, tempfile::TempDir) {
    aperture_logging::initialize_for_tests();
    let temp = tempfile::TempDir::new().unwrap();
    let config = EngineConfig {
        backend: BackendSettings::new(temp.path().join("no-such-python"), temp.path()),
        client: ClientSettings::default(),
        log_url: "ws://127.0.0.1:9/api/v1/log/ws".to_string(),
        readiness: ReadinessSettings::default(),
    };
    let (tx, rx) = mpsc::channel();
    let handle =
        EngineHandle::with_api(config, Arc::new(FakeApi), Arc::new(ChannelEventSink::new(tx)))
            .expect("engine");
    (handle, rx, temp)
}

fn next(rx: &mpsc::Receiver<EngineEvent>) -> EngineEvent {
    rx.recv_timeout(Duration::from_secs(5)).expect("event in time")
}

#[test]
fn search_results_carry_their_sequence() {
    let (mut engine, rx, _temp) = engine();
    engine.search(4, "invoice");

    assert_eq!(
        next(&rx),
        EngineEvent::SearchCompleted {
            seq: 4,
            result: Ok(SearchResponse {
                status: "success:invoice".to_string(),
                results: Vec::new(),
            }),
        }
    );
    engine.shutdown();
}

#[test]
fn fetch_and_ingest_outcomes_are_reported() {
    let (mut engine, rx, _temp) = engine();

    engine.fetch_jobs();
    match next(&rx) {
        EngineEvent::JobsFetched(Err(err)) => assert_eq!(err.kind, ClientErrorKind::Unreachable),
        other => panic!("unexpected event {other:?}"),
    }

    engine.trigger_ingest();
    assert_eq!(next(&rx), EngineEvent::IngestFinished(Ok(())));
    engine.shutdown();
}

#[test]
fn cancelled_timer_is_replaced_by_later_one() {
    let (mut engine, rx, _temp) = engine();

    engine.start_timer(TimerKind::LogReconnect, 1, Duration::from_millis(50));
    engine.cancel_timer(TimerKind::LogReconnect);
    engine.start_timer(TimerKind::SearchDebounce, 7, Duration::from_millis(100));

    assert_eq!(
        next(&rx),
        EngineEvent::TimerFired {
            timer: TimerKind::SearchDebounce,
            generation: 7,
        }
    );
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    engine.shutdown();
}

#[test]
fn spawn_failure_is_reported() {
    let (mut engine, rx, _temp) = engine();
    engine.start_backend();

    match next(&rx) {
        EngineEvent::BackendSpawnFailed { message } => {
            assert!(message.contains("no-such-python"), "{message}")
        }
        other => panic!("unexpected event {other:?}"),
    }
    engine.shutdown();
}

#[test]
fn log_connection_failure_is_reported() {
    let (mut engine, rx, _temp) = engine();
    engine.connect_log();

    assert!(matches!(next(&rx), EngineEvent::LogDisconnected { .. }));
    engine.shutdown();
}

#[test]
fn shutdown_is_idempotent() {
    let (mut engine, _rx, _temp) = engine();
    engine.shutdown();
    engine.shutdown();
    engine.stop_backend();
}
