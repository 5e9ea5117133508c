//! Streams the backend's log WebSocket into engine events.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aperture_logging::{shell_debug, shell_info, shell_warn};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::{EngineEvent, EventSink};

/// Upper bound on the TCP connect plus WebSocket upgrade.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Single-flight WebSocket client. While a connection (or an attempt) is
/// alive, further `connect` calls are refused. Reconnect pacing belongs to
/// the caller.
pub struct LogRelay {
    url: String,
    sink: Arc<dyn EventSink>,
    connect_timeout: Duration,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl LogRelay {
    pub fn new(url: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            url: url.into(),
            sink,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            active: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Starts a connection attempt. Returns `false` if one is already alive.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self) -> bool {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            shell_debug!("[Logs] Connection already in progress");
            return false;
        }

        let url = self.url.clone();
        let connect_timeout = self.connect_timeout;
        let sink = Arc::clone(&self.sink);
        let active = Arc::clone(&self.active);
        self.task = Some(tokio::spawn(async move {
            let reason = stream_lines(&url, connect_timeout, sink.as_ref()).await;
            shell_warn!("[Logs] Disconnected from {}: {}", url, reason);
            // Clear first so the host may reconnect as soon as it sees the event.
            active.store(false, Ordering::SeqCst);
            sink.emit(EngineEvent::LogDisconnected { reason });
        }));
        true
    }

    /// Drops the current connection without reporting a disconnect.
    pub fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for LogRelay {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Runs one connection to completion and returns why it ended.
async fn stream_lines(url: &str, connect_timeout: Duration, sink: &dyn EventSink) -> String {
    let handshake = tokio_tungstenite::connect_async(url);
    let (mut stream, _response) = match tokio::time::timeout(connect_timeout, handshake).await {
        Ok(Ok(connected)) => connected,
        Ok(Err(err)) => return format!("connect failed: {err}"),
        Err(_) => return "connect timed out".to_string(),
    };
    shell_info!("[Logs] Connected to {}", url);
    sink.emit(EngineEvent::LogConnected);

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let text: &str = &text;
                emit_lines(text, sink);
            }
            Ok(Message::Binary(data)) => emit_lines(&String::from_utf8_lossy(&data), sink),
            Ok(Message::Close(frame)) => {
                return match frame {
                    Some(frame) => format!("closed by server ({})", frame.code),
                    None => "closed by server".to_string(),
                };
            }
            Ok(_) => {}
            Err(err) => return format!("stream error: {err}"),
        }
    }
    "stream ended".to_string()
}

fn emit_lines(text: &str, sink: &dyn EventSink) {
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            sink.emit(EngineEvent::LogLine(line.to_string()));
        }
    }
}
