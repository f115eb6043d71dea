//! Handlers for script execution history.

use axum::extract::State;
use axum::Json;
use fleetdesk_core::error::CoreError;
use fleetdesk_core::scripting::status::EXECUTION_STATUS_NAMES;
use fleetdesk_core::types::DbId;
use fleetdesk_core::validation::validate_one_of;
use fleetdesk_db::models::page::Page;
use fleetdesk_db::models::script::{ScriptExecution, ScriptExecutionFilter};
use fleetdesk_db::repositories::ScriptExecutionRepo;

use crate::error::AppResult;
use crate::extract::{AppPath, AppQuery};
use crate::query::{non_blank, ExecutionListQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /system/executions/
///
/// Filterable by `script_id` and `status`; most recent first.
pub async fn list_executions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ExecutionListQuery>,
) -> AppResult<Json<ApiResponse<Page<ScriptExecution>>>> {
    let filter = ScriptExecutionFilter {
        script_task_id: query.script_id,
        status: non_blank(query.status),
    };
    if let Some(status) = filter.status.as_deref() {
        validate_one_of("status", status, EXECUTION_STATUS_NAMES)?;
    }
    let page = ScriptExecutionRepo::list(&state.pool, &filter, query.page, query.page_size).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /system/executions/{id}/
pub async fn get_execution(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<ScriptExecution>>> {
    let execution = ScriptExecutionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ScriptExecution",
            id,
        })?;
    Ok(Json(ApiResponse::ok(execution)))
}
