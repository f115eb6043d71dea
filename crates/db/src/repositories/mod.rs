//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Soft-deleted rows are
//! hidden through each repository's `LIVE` predicate; an execution stays
//! readable by id after its task is deleted.

pub mod project_repo;
pub mod script_execution_repo;
pub mod script_task_repo;
pub mod vehicle_repo;

pub use project_repo::ProjectSpaceRepo;
pub use script_execution_repo::ScriptExecutionRepo;
pub use script_task_repo::ScriptTaskRepo;
pub use vehicle_repo::VehicleModelRepo;

/// Result of a guarded soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// No live row with that id.
    NotFound,
    /// The row exists but dependents prevent deleting it.
    Blocked,
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
