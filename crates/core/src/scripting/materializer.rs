//! Turns a stored script body plus runtime parameters into a runnable file.
//!
//! Each call creates a fresh, exclusively-owned temporary directory holding
//! exactly one generated script. The returned [`ScriptArtifact`] owns that
//! directory; it is removed by [`ScriptArtifact::cleanup`] or, failing
//! that, when the artifact is dropped.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::TempDir;

use super::executor::{ScriptError, ScriptRuntime};

/// Prefix for per-execution workspace directories.
pub const WORKSPACE_PREFIX: &str = "fleetdesk-run-";

/// A materialized script and the workspace that contains it.
#[derive(Debug)]
pub struct ScriptArtifact {
    workspace: TempDir,
    script_path: PathBuf,
}

impl ScriptArtifact {
    /// The workspace directory; used as the child's working directory.
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Full path of the generated script file.
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Recursively remove the workspace.
    ///
    /// Best effort: a removal failure is returned for logging only and the
    /// directory is abandoned.
    pub fn cleanup(self) -> std::io::Result<()> {
        self.workspace.close()
    }
}

/// Render `content` with `params` through `runtime` and write it to a new workspace.
///
/// `workspace_root` selects where the temporary directory is created; `None`
/// uses the system temp dir.
pub fn materialize(
    runtime: &dyn ScriptRuntime,
    content: &str,
    params: &Map<String, Value>,
    workspace_root: Option<&Path>,
) -> Result<ScriptArtifact, ScriptError> {
    let rendered = runtime.render(content, params)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(WORKSPACE_PREFIX);
    let workspace = match workspace_root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };

    let script_path = workspace.path().join(runtime.file_name());
    std::fs::write(&script_path, rendered)?;

    if runtime.needs_exec_bit() {
        set_executable(&script_path)?;
    }

    Ok(ScriptArtifact {
        workspace,
        script_path,
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
