//! Lookup from a stored script type name to its runtime.

use super::executor::{ScriptError, ScriptRuntime};
use super::python::PythonRuntime;
use super::shell::ShellRuntime;
use crate::script_types::ScriptKind;

/// The set of runtimes available to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct RuntimeRegistry {
    shell: ShellRuntime,
    python: PythonRuntime,
}

impl RuntimeRegistry {
    /// Build a registry with explicit interpreter binaries.
    pub fn new(shell_bin: impl Into<String>, python_bin: impl Into<String>) -> Self {
        Self {
            shell: ShellRuntime::new(shell_bin),
            python: PythonRuntime::new(python_bin),
        }
    }

    /// Runtime for a known kind.
    pub fn get(&self, kind: ScriptKind) -> &dyn ScriptRuntime {
        match kind {
            ScriptKind::Shell => &self.shell,
            ScriptKind::Python => &self.python,
        }
    }

    /// Runtime for a stored `script_type` name.
    pub fn resolve(&self, script_type: &str) -> Result<&dyn ScriptRuntime, ScriptError> {
        ScriptKind::from_name(script_type)
            .map(|kind| self.get(kind))
            .ok_or_else(|| ScriptError::UnsupportedKind(script_type.to_string()))
    }
}
