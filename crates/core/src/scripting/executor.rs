//! Script runtime interface and shared types.
//!
//! Defines [`ScriptRuntime`], the trait each script kind implements, along
//! with [`RunInput`], [`ScriptOutput`], and [`ScriptError`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::process::Command;

use crate::script_types::ScriptKind;

/// How a materialized script is launched.
#[derive(Debug, Clone)]
pub struct RunInput {
    /// Working directory for the child process (the script's own workspace).
    pub working_directory: PathBuf,
    /// Maximum wall-clock time before the process group is killed.
    pub timeout: Duration,
}

/// Raw output captured from a finished child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptOutput {
    /// Complete stdout captured from the process.
    pub stdout: String,
    /// Complete stderr captured from the process.
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration.
    pub elapsed: Duration,
}

/// Errors raised while materializing or running a script.
#[derive(Debug)]
pub enum ScriptError {
    /// The interpreter binary could not be found.
    NotFound(String),
    /// The interpreter or script lacks execute permissions.
    PermissionDenied(String),
    /// The script exceeded its configured timeout and was killed.
    Timeout {
        /// Elapsed wall-clock time before the process was killed.
        elapsed: Duration,
    },
    /// A parameter cannot be safely rendered for the target interpreter.
    InvalidParameter(String),
    /// No runtime is registered for the script kind.
    UnsupportedKind(String),
    /// The interpreter could not be started for another reason.
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },
    /// An I/O error occurred while writing the script or talking to the process.
    IoError(std::io::Error),
}

impl ScriptError {
    /// Classify a spawn failure, keeping the interpreter name in the message.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::SpawnFailed {
                program: program.to_string(),
                source: err,
            },
        }
    }

    /// Whether the error means the child process never started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::PermissionDenied(_) | Self::SpawnFailed { .. }
        )
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(program) => write!(f, "Interpreter not found: {program}"),
            Self::PermissionDenied(path) => write!(f, "Permission denied: {path}"),
            Self::Timeout { elapsed } => {
                write!(f, "Script timed out after {}ms", elapsed.as_millis())
            }
            Self::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            Self::UnsupportedKind(kind) => write!(f, "Unsupported script type: {kind}"),
            Self::SpawnFailed { program, source } => {
                write!(f, "Failed to start {program}: {source}")
            }
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) | Self::SpawnFailed { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}

/// One implementation per script kind (shell, python, ...).
///
/// A runtime owns the trusted template for its interpreter: it turns the
/// stored body plus runtime parameters into file contents, and builds the
/// command that launches the resulting file. The stored body is appended
/// verbatim; only parameter values pass through the runtime's escaping.
pub trait ScriptRuntime: Send + Sync {
    /// The kind this runtime handles.
    fn kind(&self) -> ScriptKind;

    /// File name of the generated script inside its workspace.
    fn file_name(&self) -> &'static str;

    /// Whether the generated file must carry the owner execute bit.
    fn needs_exec_bit(&self) -> bool {
        false
    }

    /// Render the full script file for `content` with `params` injected.
    fn render(&self, content: &str, params: &Map<String, Value>) -> Result<String, ScriptError>;

    /// Interpreter binary used to launch scripts.
    fn program(&self) -> &str;

    /// Build the launch command for a materialized script.
    fn command(&self, script_path: &Path) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.arg(script_path);
        cmd
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_found() {
        let err = ScriptError::NotFound("python9".to_string());
        assert_eq!(err.to_string(), "Interpreter not found: python9");
    }

    #[test]
    fn display_timeout() {
        let err = ScriptError::Timeout {
            elapsed: Duration::from_millis(5000),
        };
        assert_eq!(err.to_string(), "Script timed out after 5000ms");
    }

    #[test]
    fn display_unsupported_kind() {
        let err = ScriptError::UnsupportedKind("perl".to_string());
        assert_eq!(err.to_string(), "Unsupported script type: perl");
    }

    #[test]
    fn spawn_not_found_is_classified() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ScriptError::from_spawn("bash5", inner);
        assert!(matches!(err, ScriptError::NotFound(ref p) if p == "bash5"));
    }

    #[test]
    fn spawn_other_error_keeps_source() {
        let err = ScriptError::from_spawn("bash", std::io::Error::other("boom"));
        assert!(
            std::error::Error::source(&err).is_some(),
            "spawn failures should keep their io::Error source"
        );
        assert!(err.is_spawn_failure());
    }

    #[test]
    fn timeout_is_not_a_spawn_failure() {
        let err = ScriptError::Timeout {
            elapsed: Duration::from_secs(1),
        };
        assert!(!err.is_spawn_failure());
    }

    #[test]
    fn error_source_none_for_non_io() {
        let err = ScriptError::InvalidParameter("bad".to_string());
        assert!(std::error::Error::source(&err).is_none());
    }
}
