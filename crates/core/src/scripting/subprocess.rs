//! Shared subprocess management.
//!
//! [`run_command`] spawns a command built by a [`ScriptRuntime`], captures
//! stdout/stderr independently, and enforces the timeout. On timeout the
//! whole process group is killed so that commands started by the script
//! (e.g. `sleep`) do not outlive it.
//!
//! [`ScriptRuntime`]: super::executor::ScriptRuntime

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::executor::{RunInput, ScriptError, ScriptOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output exceeding this limit is truncated to prevent memory exhaustion
/// from extremely verbose scripts.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Spawn `cmd`, capture stdout/stderr, and enforce `input.timeout`.
///
/// The caller sets the program and arguments; stdio, working directory and
/// process group are applied here. Stdin is closed.
pub async fn run_command(cmd: &mut Command, input: &RunInput) -> Result<ScriptOutput, ScriptError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .current_dir(&input.working_directory)
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|e| ScriptError::from_spawn(&program, e))?;
    let pid = child.id();

    // Read stdout/stderr in spawned tasks so we can still call `child.wait()`
    // (which borrows `&mut child`).
    let mut stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let mut stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    // The deadline covers draining the pipes too: background jobs started by
    // the script inherit them and can hold them open after the child exits.
    let collected = tokio::time::timeout(input.timeout, async {
        let status = child.wait().await?;
        let stdout_bytes = (&mut stdout_task).await.unwrap_or_default();
        let stderr_bytes = (&mut stderr_task).await.unwrap_or_default();
        Ok::<_, std::io::Error>((status, stdout_bytes, stderr_bytes))
    })
    .await;

    match collected {
        Ok(Ok((status, stdout_bytes, stderr_bytes))) => Ok(ScriptOutput {
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            exit_code: status.code().unwrap_or(-1),
            elapsed: start.elapsed(),
        }),
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            Err(ScriptError::IoError(e))
        }
        Err(_elapsed) => {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            stdout_task.abort();
            stderr_task.abort();
            // `child` is dropped on return, which kills the direct child
            // because we set `kill_on_drop(true)`.
            Err(ScriptError::Timeout {
                elapsed: start.elapsed(),
            })
        }
    }
}

/// Send SIGKILL to every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: `kill` has no memory-safety preconditions; a negative pid
    // addresses the process group created by `process_group(0)` above.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
///
/// Bytes past the cap are read and discarded so the writer never sees a
/// closed pipe.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
