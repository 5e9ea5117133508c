use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aperture_logging::shell_trace;
use tokio::task::JoinHandle;

use crate::{EngineEvent, EventSink, TimerKind};

/// One pending timer per kind. Restarting a kind replaces the previous timer,
/// so only the latest generation can fire.
pub struct Scheduler {
    sink: Arc<dyn EventSink>,
    pending: HashMap<TimerKind, JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            pending: HashMap::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, timer: TimerKind, generation: u64, delay: Duration) {
        self.cancel(timer);
        shell_trace!("timer {:?}#{} armed for {:?}", timer, generation, delay);
        let sink = Arc::clone(&self.sink);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.emit(EngineEvent::TimerFired { timer, generation });
        });
        self.pending.insert(timer, task);
    }

    pub fn cancel(&mut self, timer: TimerKind) {
        if let Some(task) = self.pending.remove(&timer) {
            task.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
