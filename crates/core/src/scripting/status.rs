//! Well-known execution status constants for `script_executions`.
//!
//! These must match the seed data in
//! `db/migrations/20250601000002_create_script_tables.sql`.

/// Script process is running (or queued for a worker slot).
pub const EXECUTION_RUNNING: i16 = 1;

/// Script finished with exit code 0.
pub const EXECUTION_SUCCESS: i16 = 2;

/// Script exited non-zero, could not be run, or the coordinator faulted.
pub const EXECUTION_FAILED: i16 = 3;

/// Script was killed because it exceeded its configured timeout.
pub const EXECUTION_TIMEOUT: i16 = 4;

/// Reserved; nothing transitions an execution into this state yet.
pub const EXECUTION_CANCELLED: i16 = 5;

/// Status names accepted by the execution list filter.
pub const EXECUTION_STATUS_NAMES: &[&str] =
    &["running", "success", "failed", "timeout", "cancelled"];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_constants_are_unique() {
        let statuses = [
            EXECUTION_RUNNING,
            EXECUTION_SUCCESS,
            EXECUTION_FAILED,
            EXECUTION_TIMEOUT,
            EXECUTION_CANCELLED,
        ];
        let mut unique = statuses.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), statuses.len(), "all status constants must be unique");
    }

    #[test]
    fn names_follow_id_order() {
        assert_eq!(EXECUTION_STATUS_NAMES[(EXECUTION_RUNNING - 1) as usize], "running");
        assert_eq!(EXECUTION_STATUS_NAMES[(EXECUTION_TIMEOUT - 1) as usize], "timeout");
        assert_eq!(EXECUTION_STATUS_NAMES.len(), EXECUTION_CANCELLED as usize);
    }
}
