//! Repository for the `script_tasks` table.

use fleetdesk_core::pagination::PageInfo;
use fleetdesk_core::script_types::{
    DEFAULT_RETURN_TYPE, DEFAULT_TIMEOUT_SECS, SCRIPT_STATUS_DRAFT,
};
use fleetdesk_core::types::DbId;
use sqlx::PgPool;

use super::{contains_pattern, DeleteOutcome, ScriptExecutionRepo};
use crate::models::page::Page;
use crate::models::script::{CreateScriptTask, ScriptTask, ScriptTaskFilter, UpdateScriptTask};

/// Column list for `script_tasks` SELECT queries, including joined lookup names and labels.
const COLUMNS: &str = "\
    s.id, s.name, \
    st.name AS script_type, st.label AS script_type_display, \
    rt.name AS return_type, rt.label AS return_type_display, \
    s.parameters, \
    ARRAY(SELECT jsonb_object_keys(s.parameters)) AS parameter_names, \
    s.content, s.description, \
    ss.name AS status, ss.label AS status_display, \
    s.timeout_secs AS timeout, \
    s.last_executed_at, s.execution_count, \
    s.created_at, s.updated_at";

/// Join clause used in all read queries to include lookup names.
const JOIN: &str = "\
    script_tasks s \
    JOIN script_types st ON s.script_type_id = st.id \
    JOIN return_types rt ON s.return_type_id = rt.id \
    JOIN script_statuses ss ON s.status_id = ss.id";

/// Predicate excluding soft-deleted tasks.
const LIVE: &str = "s.is_deleted = false";

/// Optional list filters; `$1` status name, `$2` script type name, `$3` name pattern.
const FILTER: &str = "\
    ($1::TEXT IS NULL OR ss.name = $1) \
    AND ($2::TEXT IS NULL OR st.name = $2) \
    AND ($3::TEXT IS NULL OR s.name ILIKE $3)";

/// Provides CRUD operations for script tasks.
pub struct ScriptTaskRepo;

impl ScriptTaskRepo {
    /// Insert a new task. Lookup names must already be validated.
    pub async fn create(pool: &PgPool, dto: &CreateScriptTask) -> Result<ScriptTask, sqlx::Error> {
        let query = "\
            INSERT INTO script_tasks (\
                name, script_type_id, return_type_id, parameters, content, \
                description, status_id, timeout_secs\
            ) VALUES (\
                $1, \
                (SELECT id FROM script_types WHERE name = $2), \
                (SELECT id FROM return_types WHERE name = $3), \
                $4, $5, $6, \
                (SELECT id FROM script_statuses WHERE name = $7), \
                $8\
            ) \
            RETURNING id";

        let id: DbId = sqlx::query_scalar(query)
            .bind(&dto.name)
            .bind(&dto.script_type)
            .bind(dto.return_type.as_deref().unwrap_or(DEFAULT_RETURN_TYPE))
            .bind(dto.parameters.as_ref().unwrap_or(&serde_json::json!({})))
            .bind(&dto.content)
            .bind(&dto.description)
            .bind(dto.status.as_deref().unwrap_or(SCRIPT_STATUS_DRAFT))
            .bind(dto.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
            .fetch_one(pool)
            .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a live task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ScriptTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {JOIN} WHERE s.id = $1 AND {LIVE}");
        sqlx::query_as::<_, ScriptTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether another live task already uses `name`.
    pub async fn name_exists(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(\
                SELECT 1 FROM script_tasks s \
                WHERE s.name = $1 AND ($2::UUID IS NULL OR s.id <> $2) AND {LIVE}\
            )"
        );
        sqlx::query_scalar(&query)
            .bind(name)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
    }

    /// List live tasks, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ScriptTaskFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<ScriptTask>, sqlx::Error> {
        let name_pattern = filter.name.as_deref().map(contains_pattern);

        let count_query = format!("SELECT COUNT(*) FROM {JOIN} WHERE {LIVE} AND {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&filter.status)
            .bind(&filter.script_type)
            .bind(&name_pattern)
            .fetch_one(pool)
            .await?;

        let pagination = PageInfo::resolve(page, page_size, total);
        let query = format!(
            "SELECT {COLUMNS} FROM {JOIN} WHERE {LIVE} AND {FILTER} \
             ORDER BY s.created_at DESC, s.id \
             LIMIT $4 OFFSET $5"
        );
        let items = sqlx::query_as::<_, ScriptTask>(&query)
            .bind(&filter.status)
            .bind(&filter.script_type)
            .bind(&name_pattern)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page { items, pagination })
    }

    /// Update a live task. Only non-`None` fields in the DTO are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateScriptTask,
    ) -> Result<Option<ScriptTask>, sqlx::Error> {
        let query = format!(
            "UPDATE script_tasks s SET \
                name = COALESCE($2, s.name), \
                script_type_id = COALESCE( \
                    (SELECT id FROM script_types WHERE name = $3), s.script_type_id), \
                return_type_id = COALESCE( \
                    (SELECT id FROM return_types WHERE name = $4), s.return_type_id), \
                parameters = COALESCE($5, s.parameters), \
                content = COALESCE($6, s.content), \
                description = COALESCE($7, s.description), \
                status_id = COALESCE( \
                    (SELECT id FROM script_statuses WHERE name = $8), s.status_id), \
                timeout_secs = COALESCE($9, s.timeout_secs) \
             WHERE s.id = $1 AND {LIVE}"
        );

        let rows_affected = sqlx::query(&query)
            .bind(id)
            .bind(&dto.name)
            .bind(&dto.script_type)
            .bind(&dto.return_type)
            .bind(&dto.parameters)
            .bind(&dto.content)
            .bind(&dto.description)
            .bind(&dto.status)
            .bind(dto.timeout)
            .execute(pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Soft-delete a task unless one of its executions is still running.
    ///
    /// The task row is locked `FOR UPDATE` first, so a concurrent
    /// [`ScriptExecutionRepo::create`](super::ScriptExecutionRepo::create)
    /// either completes before the running check or observes the deletion.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> = sqlx::query_scalar(&format!(
            "SELECT s.id FROM script_tasks s WHERE s.id = $1 AND {LIVE} FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        if ScriptExecutionRepo::has_running(&mut *tx, id).await? {
            return Ok(DeleteOutcome::Blocked);
        }

        sqlx::query("UPDATE script_tasks SET is_deleted = true WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(DeleteOutcome::Deleted)
    }

    /// Count one finished run: bump `execution_count` and stamp `last_executed_at`.
    ///
    /// Takes any executor so the caller can run it inside the transaction
    /// that finalizes the execution record.
    pub async fn record_run<'e, E>(executor: E, id: DbId) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            "UPDATE script_tasks SET \
                execution_count = execution_count + 1, \
                last_executed_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
