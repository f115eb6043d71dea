//! Well-known script lookup names.
//!
//! These must match the seed data in
//! `db/migrations/20250601000002_create_script_tables.sql`.

/// Shell runtime (executed via `bash`).
pub const SCRIPT_TYPE_BASH: &str = "bash";

/// Python runtime (executed via `python3`).
pub const SCRIPT_TYPE_PYTHON: &str = "python";

/// All script type names.
pub const SCRIPT_TYPES: &[&str] = &[SCRIPT_TYPE_BASH, SCRIPT_TYPE_PYTHON];

/// Declared output formats. Advisory only; never enforced on output.
pub const RETURN_TYPES: &[&str] = &["text", "json", "html", "xml"];

/// Default declared output format.
pub const DEFAULT_RETURN_TYPE: &str = "text";

/// Script task lifecycle statuses.
pub const SCRIPT_STATUS_DRAFT: &str = "draft";
pub const SCRIPT_STATUS_ACTIVE: &str = "active";
pub const SCRIPT_STATUS_INACTIVE: &str = "inactive";

/// All script task status names.
pub const SCRIPT_STATUSES: &[&str] = &[
    SCRIPT_STATUS_DRAFT,
    SCRIPT_STATUS_ACTIVE,
    SCRIPT_STATUS_INACTIVE,
];

/// Default execution timeout for new script tasks.
pub const DEFAULT_TIMEOUT_SECS: i32 = 300;

/// Script kinds that have a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Shell,
    Python,
}

impl ScriptKind {
    /// Parse a stored `script_type` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            SCRIPT_TYPE_BASH => Some(Self::Shell),
            SCRIPT_TYPE_PYTHON => Some(Self::Python),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Shell => SCRIPT_TYPE_BASH,
            Self::Python => SCRIPT_TYPE_PYTHON,
        }
    }
}
