use std::sync::{Arc, Mutex};
use std::time::Duration;

use aperture_engine::{EngineEvent, EventSink, Scheduler, TimerKind};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test(start_paused = true)]
async fn restarted_timer_fires_once_with_latest_generation() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = Scheduler::new(sink.clone());

    scheduler.start(TimerKind::SearchDebounce, 1, Duration::from_millis(300));
    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.start(TimerKind::SearchDebounce, 2, Duration::from_millis(300));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(sink.take().is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        sink.take(),
        vec![EngineEvent::TimerFired {
            timer: TimerKind::SearchDebounce,
            generation: 2,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_timer_never_fires() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = Scheduler::new(sink.clone());

    scheduler.start(TimerKind::LogReconnect, 1, Duration::from_millis(3000));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    scheduler.cancel(TimerKind::LogReconnect);

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert!(sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timer_kinds_are_independent() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = Scheduler::new(sink.clone());

    scheduler.start(TimerKind::IngestSettle, 1, Duration::from_millis(5000));
    scheduler.start(TimerKind::SearchDebounce, 1, Duration::from_millis(300));
    scheduler.cancel(TimerKind::SearchDebounce);
    scheduler.start(TimerKind::SearchDebounce, 2, Duration::from_millis(300));

    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert_eq!(
        sink.take(),
        vec![
            EngineEvent::TimerFired {
                timer: TimerKind::SearchDebounce,
                generation: 2,
            },
            EngineEvent::TimerFired {
                timer: TimerKind::IngestSettle,
                generation: 1,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_all_clears_every_kind() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = Scheduler::new(sink.clone());

    scheduler.start(TimerKind::IngestSettle, 1, Duration::from_millis(50));
    scheduler.start(TimerKind::LogReconnect, 1, Duration::from_millis(50));
    scheduler.cancel_all();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sink.take().is_empty());
}
