//! Handlers for script task management and execution.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use fleetdesk_core::error::CoreError;
use fleetdesk_core::script_types::{RETURN_TYPES, SCRIPT_STATUSES, SCRIPT_TYPES};
use fleetdesk_core::types::DbId;
use fleetdesk_core::validation::{
    validate_content, validate_one_of, validate_parameters, validate_required, validate_timeout,
    MAX_NAME_LEN,
};
use fleetdesk_db::models::page::Page;
use fleetdesk_db::models::script::{
    CreateScriptTask, ScriptExecution, ScriptTask, ScriptTaskFilter, UpdateScriptTask,
};
use fleetdesk_db::repositories::{DeleteOutcome, ScriptTaskRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::query::{non_blank, ScriptListQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /system/scripts/{id}/execute/`.
///
/// An empty body is accepted and means "no parameters".
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteScriptRequest {
    pub parameters: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_optional_enums(
    return_type: Option<&str>,
    status: Option<&str>,
) -> Result<(), CoreError> {
    if let Some(return_type) = return_type {
        validate_one_of("return_type", return_type, RETURN_TYPES)?;
    }
    if let Some(status) = status {
        validate_one_of("status", status, SCRIPT_STATUSES)?;
    }
    Ok(())
}

/// Validate and normalise a create request in place.
fn validate_create(input: &mut CreateScriptTask) -> Result<(), CoreError> {
    input.name = input.name.trim().to_string();
    validate_required("name", &input.name, MAX_NAME_LEN)?;
    validate_required("script_type", &input.script_type, MAX_NAME_LEN)?;
    validate_one_of("script_type", &input.script_type, SCRIPT_TYPES)?;
    validate_optional_enums(input.return_type.as_deref(), input.status.as_deref())?;
    validate_content(&input.content)?;
    if let Some(timeout) = input.timeout {
        validate_timeout(timeout)?;
    }
    let params = validate_parameters(input.parameters.as_ref())?;
    input.parameters = Some(serde_json::Value::Object(params));
    Ok(())
}

/// Validate and normalise an update request in place.
fn validate_update(input: &mut UpdateScriptTask) -> Result<(), CoreError> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_required("name", name, MAX_NAME_LEN)?;
    }
    if let Some(script_type) = input.script_type.as_deref() {
        validate_one_of("script_type", script_type, SCRIPT_TYPES)?;
    }
    validate_optional_enums(input.return_type.as_deref(), input.status.as_deref())?;
    if let Some(content) = input.content.as_deref() {
        validate_content(content)?;
    }
    if let Some(timeout) = input.timeout {
        validate_timeout(timeout)?;
    }
    if input.parameters.is_some() {
        let params = validate_parameters(input.parameters.as_ref())?;
        input.parameters = Some(serde_json::Value::Object(params));
    }
    Ok(())
}

fn duplicate_name(name: &str) -> AppError {
    CoreError::Validation(format!("A script named '{name}' already exists")).into()
}

fn script_not_found(id: DbId) -> AppError {
    CoreError::NotFound {
        entity: "ScriptTask",
        id,
    }
    .into()
}

// ---------------------------------------------------------------------------
// Script CRUD handlers
// ---------------------------------------------------------------------------

/// GET /system/scripts/
///
/// List live script tasks, newest first.
pub async fn list_scripts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ScriptListQuery>,
) -> AppResult<Json<ApiResponse<Page<ScriptTask>>>> {
    let filter = ScriptTaskFilter {
        status: non_blank(query.status),
        script_type: non_blank(query.script_type),
        name: non_blank(query.name),
    };
    validate_optional_enums(None, filter.status.as_deref())?;
    if let Some(script_type) = filter.script_type.as_deref() {
        validate_one_of("script_type", script_type, SCRIPT_TYPES)?;
    }
    let page = ScriptTaskRepo::list(&state.pool, &filter, query.page, query.page_size).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /system/scripts/
pub async fn create_script(
    State(state): State<AppState>,
    AppJson(mut input): AppJson<CreateScriptTask>,
) -> AppResult<Json<ApiResponse<ScriptTask>>> {
    validate_create(&mut input)?;

    if ScriptTaskRepo::name_exists(&state.pool, &input.name, None).await? {
        return Err(duplicate_name(&input.name));
    }

    let task = ScriptTaskRepo::create(&state.pool, &input).await?;
    tracing::info!(script_task_id = %task.id, name = %task.name, "Script task created");

    Ok(Json(ApiResponse::with_message(task, "Script created")))
}

/// GET /system/scripts/{id}/
pub async fn get_script(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<ScriptTask>>> {
    let task = ScriptTaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| script_not_found(id))?;
    Ok(Json(ApiResponse::ok(task)))
}

/// PUT /system/scripts/{id}/
///
/// Partial update: only the supplied fields change.
pub async fn update_script(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(mut input): AppJson<UpdateScriptTask>,
) -> AppResult<Json<ApiResponse<ScriptTask>>> {
    validate_update(&mut input)?;

    if let Some(name) = input.name.as_deref() {
        if ScriptTaskRepo::name_exists(&state.pool, name, Some(id)).await? {
            return Err(duplicate_name(name));
        }
    }

    let task = ScriptTaskRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| script_not_found(id))?;
    tracing::info!(script_task_id = %task.id, "Script task updated");

    Ok(Json(ApiResponse::with_message(task, "Script updated")))
}

/// DELETE /system/scripts/{id}/
///
/// Soft delete; refused with 409 while an execution is running.
pub async fn delete_script(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    match ScriptTaskRepo::soft_delete(&state.pool, id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(script_task_id = %id, "Script task deleted");
            Ok(Json(ApiResponse::with_message((), "Script deleted")))
        }
        DeleteOutcome::NotFound => Err(script_not_found(id)),
        DeleteOutcome::Blocked => Err(CoreError::Conflict(
            "Script has a running execution and cannot be deleted".to_string(),
        )
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// POST /system/scripts/{id}/execute/
///
/// Start a background run and return the new `running` execution.
pub async fn execute_script(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<ScriptExecution>>> {
    let request: ExecuteScriptRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ExecuteScriptRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let execution = state
        .coordinator
        .execute(id, request.parameters.as_ref())
        .await?;

    Ok(Json(ApiResponse::with_message(execution, "Script execution started")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn create(name: &str) -> CreateScriptTask {
        CreateScriptTask {
            name: name.to_string(),
            script_type: "bash".to_string(),
            content: "echo hi".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_trims_name_and_normalises_parameters() {
        let mut input = create("  nightly  ");
        validate_create(&mut input).unwrap();
        assert_eq!(input.name, "nightly");
        assert_eq!(input.parameters, Some(json!({})));
    }

    #[test]
    fn create_rejects_missing_fields() {
        assert_matches!(validate_create(&mut create("")), Err(CoreError::Validation(_)));

        let mut no_type = create("x");
        no_type.script_type = String::new();
        assert_matches!(validate_create(&mut no_type), Err(CoreError::Validation(_)));

        let mut blank = create("x");
        blank.content = "   ".to_string();
        assert_matches!(validate_create(&mut blank), Err(CoreError::Validation(_)));
    }

    #[test]
    fn create_rejects_bad_enums_and_timeout() {
        let mut perl = create("x");
        perl.script_type = "perl".to_string();
        assert_matches!(validate_create(&mut perl), Err(CoreError::Validation(_)));

        let mut paused = create("x");
        paused.status = Some("paused".to_string());
        assert_matches!(validate_create(&mut paused), Err(CoreError::Validation(_)));

        let mut csv = create("x");
        csv.return_type = Some("csv".to_string());
        assert_matches!(validate_create(&mut csv), Err(CoreError::Validation(_)));

        let mut zero = create("x");
        zero.timeout = Some(0);
        assert_matches!(validate_create(&mut zero), Err(CoreError::Validation(_)));
    }

    #[test]
    fn create_rejects_non_object_parameters() {
        let mut input = create("x");
        input.parameters = Some(json!(["a", "b"]));
        assert_matches!(validate_create(&mut input), Err(CoreError::Validation(_)));
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let mut empty = UpdateScriptTask::default();
        assert!(validate_update(&mut empty).is_ok());

        let mut blank_name = UpdateScriptTask {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_matches!(validate_update(&mut blank_name), Err(CoreError::Validation(_)));

        let mut negative = UpdateScriptTask {
            timeout: Some(-1),
            ..Default::default()
        };
        assert_matches!(validate_update(&mut negative), Err(CoreError::Validation(_)));
    }
}
