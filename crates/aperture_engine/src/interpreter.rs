//! Locates the Python interpreter that runs the backend.
use std::env;
use std::path::{Path, PathBuf};

use aperture_logging::{shell_info, shell_warn};

/// Explicit interpreter override.
pub const OVERRIDE_ENV: &str = "PYTHON_PATH";
/// Root of an active virtual environment.
pub const VENV_ENV: &str = "VIRTUAL_ENV";

#[cfg(target_os = "windows")]
pub const DEFAULT_INTERPRETER: &str = "python";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_INTERPRETER: &str = "python3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterSource {
    Override,
    VirtualEnv,
    SearchPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterpreter {
    pub path: PathBuf,
    pub source: InterpreterSource,
}

/// Interpreter location inside a virtual environment root.
pub fn venv_interpreter(venv_root: &Path) -> PathBuf {
    if cfg!(target_os = "windows") {
        venv_root.join("Scripts").join("python.exe")
    } else {
        venv_root.join("bin").join("python3")
    }
}

/// Picks the first candidate that exists: override, then venv, then the
/// platform default looked up on the search path.
pub fn resolve(override_path: Option<&Path>, venv_root: Option<&Path>) -> ResolvedInterpreter {
    if let Some(path) = override_path.filter(|path| path.exists()) {
        return ResolvedInterpreter {
            path: path.to_path_buf(),
            source: InterpreterSource::Override,
        };
    }

    if let Some(path) = venv_root
        .map(venv_interpreter)
        .filter(|candidate| candidate.exists())
    {
        return ResolvedInterpreter {
            path,
            source: InterpreterSource::VirtualEnv,
        };
    }

    ResolvedInterpreter {
        path: PathBuf::from(DEFAULT_INTERPRETER),
        source: InterpreterSource::SearchPath,
    }
}

/// [`resolve`] driven by `PYTHON_PATH` and `VIRTUAL_ENV`. Empty values count as unset.
pub fn resolve_from_env() -> ResolvedInterpreter {
    let override_path = non_empty_var(OVERRIDE_ENV).map(PathBuf::from);
    let venv_root = non_empty_var(VENV_ENV).map(PathBuf::from);

    if let Some(path) = override_path.as_deref().filter(|path| !path.exists()) {
        shell_warn!(
            "[Backend] {} points at {} which does not exist; ignoring it",
            OVERRIDE_ENV,
            path.display()
        );
    }

    let resolved = resolve(override_path.as_deref(), venv_root.as_deref());
    shell_info!(
        "[Backend] Using interpreter {} ({:?})",
        resolved.path.display(),
        resolved.source
    );
    resolved
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var_os(name)
        .map(|value| value.to_string_lossy().trim().to_string())
        .filter(|value| !value.is_empty())
}
