use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use aperture_core::{CoreSettings, MIN_QUERY_CHARS};
use aperture_engine::{
    BackendSettings, ClientSettings, EngineConfig, ReadinessSettings, DEFAULT_APP_TARGET,
    DEFAULT_HOST, DEFAULT_PORT,
};
use aperture_logging::{parse_level, LogDestination, LogSettings};
use serde::{Deserialize, Serialize};

/// Names the configuration file; defaults to `aperture.ron` in the working directory.
pub(crate) const CONFIG_ENV: &str = "APERTURE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "aperture.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// Host configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ShellConfig {
    /// Directory the backend is launched from; the working directory when unset.
    pub app_root: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub app_target: String,
    pub api_prefix: String,
    pub search_debounce_ms: u64,
    pub reconnect_delay_ms: u64,
    pub ingest_settle_ms: u64,
    pub min_query_chars: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_destination: LogTarget,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let core = CoreSettings::default();
        let client = ClientSettings::default();
        Self {
            app_root: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            app_target: DEFAULT_APP_TARGET.to_string(),
            api_prefix: "/api/v1".to_string(),
            search_debounce_ms: millis(core.search_debounce),
            reconnect_delay_ms: millis(core.reconnect_delay),
            ingest_settle_ms: millis(core.ingest_settle),
            min_query_chars: MIN_QUERY_CHARS,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            log_destination: LogTarget::File,
            log_level: "info".to_string(),
            log_file: PathBuf::from("./aperture.log"),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ShellConfig {
    pub(crate) fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            ingest_settle: Duration::from_millis(self.ingest_settle_ms),
            min_query_chars: self.min_query_chars.max(1),
        }
    }

    pub(crate) fn log_settings(&self) -> LogSettings {
        LogSettings {
            destination: self.log_destination.into(),
            level: parse_level(&self.log_level),
            file_path: self.log_file.clone(),
        }
    }

    fn prefix(&self) -> &str {
        self.api_prefix.trim_matches('/')
    }

    pub(crate) fn log_url(&self) -> String {
        if self.prefix().is_empty() {
            format!("ws://{}:{}/log/ws", self.host, self.port)
        } else {
            format!("ws://{}:{}/{}/log/ws", self.host, self.port, self.prefix())
        }
    }

    pub(crate) fn engine_config(&self, interpreter: PathBuf) -> EngineConfig {
        let app_root = self
            .app_root
            .clone()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut backend = BackendSettings::new(interpreter, app_root);
        backend.host = self.host.clone();
        backend.port = self.port;
        backend.app_target = self.app_target.clone();

        let mut client = ClientSettings::for_backend(&self.host, self.port, self.prefix());
        client.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        client.request_timeout = Duration::from_secs(self.request_timeout_secs);

        EngineConfig {
            backend,
            client,
            log_url: self.log_url(),
            readiness: ReadinessSettings::default(),
        }
    }
}

pub(crate) fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Reads the configuration file. A missing file is `Ok(None)`.
pub(crate) fn load(path: &Path) -> anyhow::Result<Option<ShellConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_not_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert_eq!(load(&temp.path().join("aperture.ron")).unwrap(), None);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("aperture.ron");
        fs::write(&path, "(port: 8100, log_destination: Both, min_query_chars: 4)").unwrap();

        let config = load(&path).unwrap().unwrap();
        assert_eq!(config.port, 8100);
        assert_eq!(config.log_destination, LogTarget::Both);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.core_settings().min_query_chars, 4);
        assert_eq!(
            config.core_settings().search_debounce,
            Duration::from_millis(300)
        );
    }

    #[test]
    fn invalid_file_reports_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("aperture.ron");
        fs::write(&path, "(port: \"eight thousand\")").unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("aperture.ron"));
    }

    #[test]
    fn urls_follow_host_port_and_prefix() {
        let config = ShellConfig {
            port: 9000,
            ..ShellConfig::default()
        };
        assert_eq!(config.log_url(), "ws://127.0.0.1:9000/api/v1/log/ws");

        let engine = config.engine_config(PathBuf::from("python3"));
        assert_eq!(engine.client.base_url, "http://127.0.0.1:9000/api/v1");
        assert_eq!(engine.backend.port, 9000);
        assert_eq!(engine.client.request_timeout, Duration::from_secs(30));

        let bare = ShellConfig {
            api_prefix: "/".to_string(),
            ..ShellConfig::default()
        };
        assert_eq!(bare.log_url(), "ws://127.0.0.1:8000/log/ws");
    }
}
