//! Query parameter types for the list endpoints.
//!
//! Paging fields are repeated in each struct instead of flattened:
//! `serde(flatten)` loses the numeric types when deserializing query strings.

use fleetdesk_core::types::DbId;
use serde::Deserialize;

/// `GET /system/scripts/`
#[derive(Debug, Default, Deserialize)]
pub struct ScriptListQuery {
    pub status: Option<String>,
    pub script_type: Option<String>,
    pub name: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// `GET /system/executions/`
#[derive(Debug, Default, Deserialize)]
pub struct ExecutionListQuery {
    pub script_id: Option<DbId>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// `GET /projects/`
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub is_active: Option<bool>,
    pub name: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// `GET /vehicles/`
#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    pub project_id: Option<DbId>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Treat an empty or whitespace-only filter (`?name=`) as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
