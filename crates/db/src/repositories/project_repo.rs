//! Repository for the `project_spaces` table.

use fleetdesk_core::pagination::PageInfo;
use fleetdesk_core::types::DbId;
use sqlx::PgPool;

use super::{contains_pattern, DeleteOutcome};
use crate::models::page::Page;
use crate::models::project::{
    CreateProjectSpace, ProjectSpace, ProjectSpaceFilter, UpdateProjectSpace,
};

/// Column list for `project_spaces` SELECT queries, including the live vehicle count.
const COLUMNS: &str = "\
    p.id, p.name, p.is_active, p.description, \
    (SELECT COUNT(*) FROM vehicle_models v \
     WHERE v.project_space_id = p.id AND v.is_deleted = false) AS vehicle_count, \
    p.created_at, p.updated_at";

/// Predicate excluding soft-deleted projects.
const LIVE: &str = "p.is_deleted = false";

/// Optional list filters; `$1` active flag, `$2` name pattern.
const FILTER: &str = "\
    ($1::BOOLEAN IS NULL OR p.is_active = $1) \
    AND ($2::TEXT IS NULL OR p.name ILIKE $2)";

/// Provides CRUD operations for project spaces.
pub struct ProjectSpaceRepo;

impl ProjectSpaceRepo {
    /// Insert a new project space.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateProjectSpace,
    ) -> Result<ProjectSpace, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO project_spaces (name, is_active, description) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(&dto.name)
        .bind(dto.is_active.unwrap_or(true))
        .bind(&dto.description)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a live project space by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectSpace>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_spaces p WHERE p.id = $1 AND {LIVE}");
        sqlx::query_as::<_, ProjectSpace>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether another live project already uses `name`.
    pub async fn name_exists(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(\
                SELECT 1 FROM project_spaces p \
                WHERE p.name = $1 AND ($2::UUID IS NULL OR p.id <> $2) AND {LIVE}\
            )"
        );
        sqlx::query_scalar(&query)
            .bind(name)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
    }

    /// List live project spaces, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectSpaceFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<ProjectSpace>, sqlx::Error> {
        let name_pattern = filter.name.as_deref().map(contains_pattern);

        let count_query =
            format!("SELECT COUNT(*) FROM project_spaces p WHERE {LIVE} AND {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.is_active)
            .bind(&name_pattern)
            .fetch_one(pool)
            .await?;

        let pagination = PageInfo::resolve(page, page_size, total);
        let query = format!(
            "SELECT {COLUMNS} FROM project_spaces p WHERE {LIVE} AND {FILTER} \
             ORDER BY p.created_at DESC, p.id \
             LIMIT $3 OFFSET $4"
        );
        let items = sqlx::query_as::<_, ProjectSpace>(&query)
            .bind(filter.is_active)
            .bind(&name_pattern)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page { items, pagination })
    }

    /// Update a live project space. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateProjectSpace,
    ) -> Result<Option<ProjectSpace>, sqlx::Error> {
        let query = format!(
            "UPDATE project_spaces p SET \
                name = COALESCE($2, p.name), \
                is_active = COALESCE($3, p.is_active), \
                description = COALESCE($4, p.description) \
             WHERE p.id = $1 AND {LIVE}"
        );

        let rows_affected = sqlx::query(&query)
            .bind(id)
            .bind(&dto.name)
            .bind(dto.is_active)
            .bind(&dto.description)
            .execute(pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Soft-delete a project space unless it still has live vehicles.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> = sqlx::query_scalar(&format!(
            "SELECT p.id FROM project_spaces p WHERE p.id = $1 AND {LIVE} FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let has_vehicles: bool = sqlx::query_scalar(
            "SELECT EXISTS(\
                SELECT 1 FROM vehicle_models \
                WHERE project_space_id = $1 AND is_deleted = false\
            )",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if has_vehicles {
            return Ok(DeleteOutcome::Blocked);
        }

        sqlx::query("UPDATE project_spaces SET is_deleted = true WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(DeleteOutcome::Deleted)
    }
}
