//! Repository for the `vehicle_models` table.

use fleetdesk_core::pagination::PageInfo;
use fleetdesk_core::types::DbId;
use sqlx::PgPool;

use super::contains_pattern;
use crate::models::page::Page;
use crate::models::vehicle::{
    CreateVehicleModel, UpdateVehicleModel, VehicleModel, VehicleModelFilter,
};

/// Column list for `vehicle_models` SELECT queries, including the project name.
const COLUMNS: &str = "\
    v.id, v.project_space_id, p.name AS project_space_name, \
    v.name, v.code, v.module, v.description, v.pipelines, \
    v.created_at, v.updated_at";

const JOIN: &str = "vehicle_models v JOIN project_spaces p ON v.project_space_id = p.id";

/// Predicate excluding soft-deleted vehicles.
const LIVE: &str = "v.is_deleted = false";

/// Optional list filters; `$1` project id, `$2` name pattern, `$3` code pattern.
const FILTER: &str = "\
    ($1::UUID IS NULL OR v.project_space_id = $1) \
    AND ($2::TEXT IS NULL OR v.name ILIKE $2) \
    AND ($3::TEXT IS NULL OR v.code ILIKE $3)";

/// Provides CRUD operations for vehicle models.
pub struct VehicleModelRepo;

impl VehicleModelRepo {
    /// Insert a new vehicle under `project_space_id`.
    pub async fn create(
        pool: &PgPool,
        project_space_id: DbId,
        dto: &CreateVehicleModel,
    ) -> Result<VehicleModel, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO vehicle_models \
                (project_space_id, name, code, module, description, pipelines) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(project_space_id)
        .bind(&dto.name)
        .bind(&dto.code)
        .bind(dto.module.as_deref().unwrap_or(""))
        .bind(&dto.description)
        .bind(dto.pipelines.as_ref().unwrap_or(&serde_json::json!([])))
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a live vehicle by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VehicleModel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {JOIN} WHERE v.id = $1 AND {LIVE}");
        let vehicle = sqlx::query_as::<_, VehicleModel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(vehicle.map(VehicleModel::with_pipeline_names))
    }

    /// Whether another live vehicle already uses `code`.
    pub async fn code_exists(
        pool: &PgPool,
        code: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(\
                SELECT 1 FROM vehicle_models v \
                WHERE v.code = $1 AND ($2::UUID IS NULL OR v.id <> $2) AND {LIVE}\
            )"
        );
        sqlx::query_scalar(&query)
            .bind(code)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
    }

    /// List live vehicles, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &VehicleModelFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<VehicleModel>, sqlx::Error> {
        let name_pattern = filter.name.as_deref().map(contains_pattern);
        let code_pattern = filter.code.as_deref().map(contains_pattern);

        let count_query = format!("SELECT COUNT(*) FROM {JOIN} WHERE {LIVE} AND {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.project_space_id)
            .bind(&name_pattern)
            .bind(&code_pattern)
            .fetch_one(pool)
            .await?;

        let pagination = PageInfo::resolve(page, page_size, total);
        let query = format!(
            "SELECT {COLUMNS} FROM {JOIN} WHERE {LIVE} AND {FILTER} \
             ORDER BY v.created_at DESC, v.id \
             LIMIT $4 OFFSET $5"
        );
        let items = sqlx::query_as::<_, VehicleModel>(&query)
            .bind(filter.project_space_id)
            .bind(&name_pattern)
            .bind(&code_pattern)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(VehicleModel::with_pipeline_names)
            .collect();

        Ok(Page { items, pagination })
    }

    /// Update a live vehicle. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateVehicleModel,
    ) -> Result<Option<VehicleModel>, sqlx::Error> {
        let query = format!(
            "UPDATE vehicle_models v SET \
                project_space_id = COALESCE($2, v.project_space_id), \
                name = COALESCE($3, v.name), \
                code = COALESCE($4, v.code), \
                module = COALESCE($5, v.module), \
                description = COALESCE($6, v.description), \
                pipelines = COALESCE($7, v.pipelines) \
             WHERE v.id = $1 AND {LIVE}"
        );

        let rows_affected = sqlx::query(&query)
            .bind(id)
            .bind(dto.project_space_id)
            .bind(&dto.name)
            .bind(&dto.code)
            .bind(&dto.module)
            .bind(&dto.description)
            .bind(&dto.pipelines)
            .execute(pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Soft-delete a vehicle. Returns `true` if a live row was deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query =
            format!("UPDATE vehicle_models v SET is_deleted = true WHERE v.id = $1 AND {LIVE}");
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
