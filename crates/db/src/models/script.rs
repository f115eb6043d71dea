//! Script task and script execution models and DTOs.
//!
//! Models for the `script_tasks` and `script_executions` tables. Lookup
//! columns (`script_type_id`, `return_type_id`, `status_id`) are exposed by
//! name plus display label instead of by id.

use fleetdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Script tasks
// ---------------------------------------------------------------------------

/// A stored script definition, joined with its lookup names and labels.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScriptTask {
    pub id: DbId,
    pub name: String,
    /// Joined from `script_types.name`.
    pub script_type: String,
    /// Joined from `script_types.label`.
    pub script_type_display: String,
    pub return_type: String,
    pub return_type_display: String,
    /// Parameter declarations keyed by parameter name.
    pub parameters: serde_json::Value,
    /// Keys of `parameters`, computed in SQL.
    pub parameter_names: Vec<String>,
    pub content: String,
    pub description: Option<String>,
    pub status: String,
    pub status_display: String,
    /// Seconds; stored as `timeout_secs`.
    pub timeout: i32,
    pub last_executed_at: Option<Timestamp>,
    pub execution_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a script task.
///
/// Required strings default to empty so that a missing field is reported by
/// validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateScriptTask {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub script_type: String,
    pub return_type: Option<String>,
    pub parameters: Option<serde_json::Value>,
    #[serde(default)]
    pub content: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub timeout: Option<i32>,
}

/// DTO for updating a script task. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScriptTask {
    pub name: Option<String>,
    pub script_type: Option<String>,
    pub return_type: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub timeout: Option<i32>,
}

/// Filters for listing script tasks.
#[derive(Debug, Clone, Default)]
pub struct ScriptTaskFilter {
    pub status: Option<String>,
    pub script_type: Option<String>,
    /// Case-insensitive substring match on the task name.
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Script executions
// ---------------------------------------------------------------------------

/// One run of a script task.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScriptExecution {
    pub id: DbId,
    #[serde(rename = "script_task")]
    pub script_task_id: DbId,
    /// Joined from `script_tasks.name`.
    pub script_name: String,
    pub status: String,
    pub status_display: String,
    pub input_parameters: serde_json::Value,
    pub output: Option<String>,
    pub error_message: Option<String>,
    /// Seconds spent running the child process.
    pub execution_time: Option<f64>,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for opening a new `running` execution.
#[derive(Debug, Clone)]
pub struct CreateScriptExecution {
    pub script_task_id: DbId,
    pub input_parameters: serde_json::Value,
}

/// Terminal state written when a run ends.
#[derive(Debug, Clone)]
pub struct FinishScriptExecution {
    pub status_id: i16,
    pub output: Option<String>,
    pub error_message: Option<String>,
    pub execution_time: Option<f64>,
}

/// Filters for listing executions.
#[derive(Debug, Clone, Default)]
pub struct ScriptExecutionFilter {
    pub script_task_id: Option<DbId>,
    pub status: Option<String>,
}
