//! Runs a materialized script and folds every result into a [`RunOutcome`].
//!
//! [`run`] never returns an error: spawn faults, non-zero exits and
//! timeouts are all reported through the outcome so the caller only has
//! one shape to persist.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::executor::{RunInput, ScriptError, ScriptRuntime};
use super::materializer::ScriptArtifact;
use super::subprocess;

/// Error text recorded when a script is cut off by its timeout.
pub const TIMEOUT_MESSAGE: &str = "Script execution timed out";

/// Section header for captured stdout in the combined output.
pub const STDOUT_HEADER: &str = "=== Standard Output ===";

/// Section header for captured stderr in the combined output.
pub const STDERR_HEADER: &str = "=== Error Output ===";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Exit code zero.
    Succeeded,
    /// Non-zero exit, or the process could not be run.
    Failed,
    /// Killed after exceeding the timeout.
    TimedOut,
}

/// Result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Labelled stdout/stderr blocks; empty on timeout or spawn failure.
    pub output: String,
    /// Captured stderr, the timeout message, or the fault description.
    pub error: String,
    /// Wall-clock seconds spent, including time before a fault surfaced.
    pub elapsed_secs: f64,
    /// Whether the interpreter process was started at all.
    pub spawned: bool,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    fn fault(status: RunStatus, error: String, elapsed: Duration, spawned: bool) -> Self {
        Self {
            status,
            output: String::new(),
            error,
            elapsed_secs: elapsed.as_secs_f64(),
            spawned,
        }
    }
}

/// Execute `artifact` with `runtime`'s interpreter, waiting at most `timeout`.
pub async fn run(
    runtime: &dyn ScriptRuntime,
    artifact: &ScriptArtifact,
    timeout: Duration,
) -> RunOutcome {
    let input = RunInput {
        working_directory: artifact.workspace().to_path_buf(),
        timeout,
    };
    let mut cmd = runtime.command(artifact.script_path());

    let start = Instant::now();
    match subprocess::run_command(&mut cmd, &input).await {
        Ok(output) => RunOutcome {
            status: if output.exit_code == 0 {
                RunStatus::Succeeded
            } else {
                RunStatus::Failed
            },
            output: combine_output(&output.stdout, &output.stderr),
            error: output.stderr,
            elapsed_secs: output.elapsed.as_secs_f64(),
            spawned: true,
        },
        Err(ScriptError::Timeout { elapsed }) => {
            RunOutcome::fault(RunStatus::TimedOut, TIMEOUT_MESSAGE.to_string(), elapsed, true)
        }
        Err(e) => {
            let spawned = !e.is_spawn_failure();
            RunOutcome::fault(RunStatus::Failed, e.to_string(), start.elapsed(), spawned)
        }
    }
}

/// Join stdout and stderr into labelled sections, skipping empty streams.
pub fn combine_output(stdout: &str, stderr: &str) -> String {
    let mut combined = String::new();
    if !stdout.is_empty() {
        combined.push_str(&format!("{STDOUT_HEADER}\n{stdout}\n"));
    }
    if !stderr.is_empty() {
        combined.push_str(&format!("{STDERR_HEADER}\n{stderr}\n"));
    }
    combined.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;
    use crate::scripting::materializer::materialize;
    use crate::scripting::python::PythonRuntime;
    use crate::scripting::shell::ShellRuntime;

    async fn run_shell(body: &str, timeout: Duration) -> RunOutcome {
        let runtime = ShellRuntime::default();
        let artifact = materialize(&runtime, body, &Map::new(), None).expect("materialize");
        let outcome = run(&runtime, &artifact, timeout).await;
        artifact.cleanup().expect("cleanup");
        outcome
    }

    #[test]
    fn combine_includes_only_non_empty_sections() {
        assert_eq!(combine_output("", ""), "");
        assert_eq!(combine_output("hi\n", ""), "=== Standard Output ===\nhi");
        assert_eq!(combine_output("", "oops\n"), "=== Error Output ===\noops");
        assert_eq!(
            combine_output("a\n", "b\n"),
            "=== Standard Output ===\na\n\n=== Error Output ===\nb"
        );
    }

    #[tokio::test]
    async fn successful_echo() {
        let outcome = run_shell("echo hello", Duration::from_secs(5)).await;
        assert!(outcome.succeeded());
        assert!(outcome.output.contains(STDOUT_HEADER));
        assert!(outcome.output.contains("hello"));
        assert!(!outcome.output.contains(STDERR_HEADER));
        assert!(outcome.error.is_empty());
    }

    #[tokio::test]
    async fn failure_preserves_partial_output() {
        let outcome =
            run_shell("echo before; echo broken >&2; exit 2", Duration::from_secs(5)).await;
        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(outcome.output.contains("before"));
        assert!(outcome.output.contains(STDERR_HEADER));
        assert_eq!(outcome.error, "broken\n");
    }

    #[tokio::test]
    async fn timeout_is_reported_with_elapsed_near_limit() {
        let outcome = run_shell("sleep 5", Duration::from_secs(1)).await;
        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.error, TIMEOUT_MESSAGE);
        assert!(outcome.spawned);
        assert!(
            (0.9..3.0).contains(&outcome.elapsed_secs),
            "elapsed {} should be close to the 1s timeout",
            outcome.elapsed_secs
        );
    }

    #[tokio::test]
    async fn detached_background_job_still_times_out() {
        let outcome = run_shell("sleep 6 &\necho hi", Duration::from_secs(1)).await;
        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(
            outcome.elapsed_secs < 4.0,
            "elapsed {} should stop near the 1s timeout",
            outcome.elapsed_secs
        );
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_failed_outcome() {
        let runtime = PythonRuntime::new("no-such-python-interpreter");
        let artifact = materialize(&runtime, "print(1)", &Map::new(), None).expect("materialize");
        let outcome = run(&runtime, &artifact, Duration::from_secs(5)).await;

        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(outcome.output.is_empty());
        assert!(outcome.error.contains("no-such-python-interpreter"));
        assert!(!outcome.spawned);
    }

    #[tokio::test]
    async fn shell_parameters_are_visible_to_the_script() {
        let runtime = ShellRuntime::default();
        let params = json!({"GREETING": "hi there"}).as_object().cloned().expect("object");
        let artifact =
            materialize(&runtime, "echo \"$GREETING\"", &params, None).expect("materialize");
        let outcome = run(&runtime, &artifact, Duration::from_secs(5)).await;

        assert!(outcome.succeeded());
        assert!(outcome.output.contains("hi there"));
    }
}
