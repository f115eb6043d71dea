//! Handlers for project spaces.

use axum::extract::State;
use axum::Json;
use fleetdesk_core::error::CoreError;
use fleetdesk_core::types::DbId;
use fleetdesk_core::validation::{validate_required, MAX_NAME_LEN};
use fleetdesk_db::models::page::Page;
use fleetdesk_db::models::project::{
    CreateProjectSpace, ProjectSpace, ProjectSpaceFilter, UpdateProjectSpace,
};
use fleetdesk_db::repositories::{DeleteOutcome, ProjectSpaceRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::query::{non_blank, ProjectListQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

fn project_not_found(id: DbId) -> AppError {
    CoreError::NotFound {
        entity: "ProjectSpace",
        id,
    }
    .into()
}

/// Reject `name` if another live project already uses it.
async fn ensure_unique_name(
    state: &AppState,
    name: &str,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if ProjectSpaceRepo::name_exists(&state.pool, name, exclude_id).await? {
        let message = format!("A project named '{name}' already exists");
        return Err(CoreError::Validation(message).into());
    }
    Ok(())
}

/// GET /projects/
pub async fn list_projects(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProjectListQuery>,
) -> AppResult<Json<ApiResponse<Page<ProjectSpace>>>> {
    let filter = ProjectSpaceFilter {
        is_active: query.is_active,
        name: non_blank(query.name),
    };
    let page = ProjectSpaceRepo::list(&state.pool, &filter, query.page, query.page_size).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /projects/
pub async fn create_project(
    State(state): State<AppState>,
    AppJson(mut input): AppJson<CreateProjectSpace>,
) -> AppResult<Json<ApiResponse<ProjectSpace>>> {
    input.name = input.name.trim().to_string();
    validate_required("name", &input.name, MAX_NAME_LEN)?;
    ensure_unique_name(&state, &input.name, None).await?;

    let project = ProjectSpaceRepo::create(&state.pool, &input).await?;
    tracing::info!(project_space_id = %project.id, name = %project.name, "Project created");

    Ok(Json(ApiResponse::with_message(project, "Project created")))
}

/// GET /projects/{id}/
pub async fn get_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<ProjectSpace>>> {
    let project = ProjectSpaceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| project_not_found(id))?;
    Ok(Json(ApiResponse::ok(project)))
}

/// PUT /projects/{id}/
pub async fn update_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(mut input): AppJson<UpdateProjectSpace>,
) -> AppResult<Json<ApiResponse<ProjectSpace>>> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_required("name", name, MAX_NAME_LEN)?;
    }
    if let Some(name) = input.name.as_deref() {
        ensure_unique_name(&state, name, Some(id)).await?;
    }

    let project = ProjectSpaceRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| project_not_found(id))?;
    tracing::info!(project_space_id = %project.id, "Project updated");

    Ok(Json(ApiResponse::with_message(project, "Project updated")))
}

/// DELETE /projects/{id}/
///
/// Soft delete; refused with 409 while the project still has vehicles.
pub async fn delete_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    match ProjectSpaceRepo::soft_delete(&state.pool, id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(project_space_id = %id, "Project deleted");
            Ok(Json(ApiResponse::with_message((), "Project deleted")))
        }
        DeleteOutcome::NotFound => Err(project_not_found(id)),
        DeleteOutcome::Blocked => Err(CoreError::Conflict(
            "Project still has vehicles and cannot be deleted".to_string(),
        )
        .into()),
    }
}
