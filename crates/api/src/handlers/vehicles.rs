//! Handlers for vehicle models.

use axum::extract::State;
use axum::Json;
use fleetdesk_core::error::CoreError;
use fleetdesk_core::types::DbId;
use fleetdesk_core::validation::{validate_required, MAX_CODE_LEN, MAX_NAME_LEN};
use fleetdesk_core::vehicle::validate_pipelines;
use fleetdesk_db::models::page::Page;
use fleetdesk_db::models::vehicle::{
    CreateVehicleModel, UpdateVehicleModel, VehicleModel, VehicleModelFilter,
};
use fleetdesk_db::repositories::{ProjectSpaceRepo, VehicleModelRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::query::{non_blank, VehicleListQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

fn vehicle_not_found(id: DbId) -> AppError {
    CoreError::NotFound {
        entity: "VehicleModel",
        id,
    }
    .into()
}

/// Require a live, active project to attach a vehicle to.
async fn ensure_active_project(state: &AppState, project_space_id: DbId) -> AppResult<()> {
    let project = ProjectSpaceRepo::find_by_id(&state.pool, project_space_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ProjectSpace",
            id: project_space_id,
        })?;
    if !project.is_active {
        return Err(CoreError::Conflict(format!(
            "Project '{}' is not active",
            project.name
        ))
        .into());
    }
    Ok(())
}

/// Reject `code` if another live vehicle already uses it.
async fn ensure_unique_code(
    state: &AppState,
    code: &str,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if VehicleModelRepo::code_exists(&state.pool, code, exclude_id).await? {
        return Err(CoreError::Validation(format!("Vehicle code '{code}' already exists")).into());
    }
    Ok(())
}

/// GET /vehicles/
pub async fn list_vehicles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<VehicleListQuery>,
) -> AppResult<Json<ApiResponse<Page<VehicleModel>>>> {
    let filter = VehicleModelFilter {
        project_space_id: query.project_id,
        name: non_blank(query.name),
        code: non_blank(query.code),
    };
    let page = VehicleModelRepo::list(&state.pool, &filter, query.page, query.page_size).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /vehicles/
pub async fn create_vehicle(
    State(state): State<AppState>,
    AppJson(mut input): AppJson<CreateVehicleModel>,
) -> AppResult<Json<ApiResponse<VehicleModel>>> {
    let project_space_id = input
        .project_space_id
        .ok_or_else(|| CoreError::Validation("project_space is required".to_string()))?;
    input.name = input.name.trim().to_string();
    input.code = input.code.trim().to_string();
    validate_required("name", &input.name, MAX_NAME_LEN)?;
    validate_required("code", &input.code, MAX_CODE_LEN)?;
    if let Some(pipelines) = input.pipelines.as_ref() {
        validate_pipelines(pipelines)?;
    }

    ensure_active_project(&state, project_space_id).await?;
    ensure_unique_code(&state, &input.code, None).await?;

    let vehicle = VehicleModelRepo::create(&state.pool, project_space_id, &input).await?;
    tracing::info!(vehicle_model_id = %vehicle.id, code = %vehicle.code, "Vehicle created");

    Ok(Json(ApiResponse::with_message(vehicle, "Vehicle created")))
}

/// GET /vehicles/{id}/
pub async fn get_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<VehicleModel>>> {
    let vehicle = VehicleModelRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| vehicle_not_found(id))?;
    Ok(Json(ApiResponse::ok(vehicle)))
}

/// PUT /vehicles/{id}/
///
/// Moving a vehicle re-checks the target project.
pub async fn update_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(mut input): AppJson<UpdateVehicleModel>,
) -> AppResult<Json<ApiResponse<VehicleModel>>> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_required("name", name, MAX_NAME_LEN)?;
    }
    if let Some(code) = input.code.as_mut() {
        *code = code.trim().to_string();
        validate_required("code", code, MAX_CODE_LEN)?;
    }
    if let Some(pipelines) = input.pipelines.as_ref() {
        validate_pipelines(pipelines)?;
    }

    if let Some(project_space_id) = input.project_space_id {
        ensure_active_project(&state, project_space_id).await?;
    }
    if let Some(code) = input.code.as_deref() {
        ensure_unique_code(&state, code, Some(id)).await?;
    }

    let vehicle = VehicleModelRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| vehicle_not_found(id))?;
    tracing::info!(vehicle_model_id = %vehicle.id, "Vehicle updated");

    Ok(Json(ApiResponse::with_message(vehicle, "Vehicle updated")))
}

/// DELETE /vehicles/{id}/
pub async fn delete_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !VehicleModelRepo::soft_delete(&state.pool, id).await? {
        return Err(vehicle_not_found(id));
    }
    tracing::info!(vehicle_model_id = %id, "Vehicle deleted");
    Ok(Json(ApiResponse::with_message((), "Vehicle deleted")))
}
