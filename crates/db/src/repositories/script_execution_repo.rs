//! Repository for the `script_executions` table.

use fleetdesk_core::pagination::PageInfo;
use fleetdesk_core::scripting::status::{EXECUTION_FAILED, EXECUTION_RUNNING};
use fleetdesk_core::types::DbId;
use sqlx::PgPool;

use super::ScriptTaskRepo;
use crate::models::page::Page;
use crate::models::script::{
    CreateScriptExecution, FinishScriptExecution, ScriptExecution, ScriptExecutionFilter,
};

/// Column list for `script_executions` SELECT queries, including joined names.
const COLUMNS: &str = "\
    se.id, se.script_task_id, s.name AS script_name, \
    es.name AS status, es.label AS status_display, \
    se.input_parameters, se.output, se.error_message, se.execution_time, \
    se.started_at, se.finished_at, se.created_at";

/// Join clause used in all read queries.
const JOIN: &str = "\
    script_executions se \
    JOIN execution_statuses es ON se.status_id = es.id \
    JOIN script_tasks s ON se.script_task_id = s.id";

/// Listing shows only executions of live tasks; detail lookups ignore it.
const LIVE: &str = "s.is_deleted = false";

/// Optional list filters; `$1` task id, `$2` status name.
const FILTER: &str = "\
    ($1::UUID IS NULL OR se.script_task_id = $1) \
    AND ($2::TEXT IS NULL OR es.name = $2)";

/// Provides query and state-transition operations for execution records.
pub struct ScriptExecutionRepo;

impl ScriptExecutionRepo {
    /// Open a `running` execution for a live task.
    ///
    /// Returns `None` when the task is missing or soft-deleted. The task row
    /// is share-locked for the insert, which serializes against
    /// [`ScriptTaskRepo::soft_delete`].
    pub async fn create(
        pool: &PgPool,
        dto: &CreateScriptExecution,
    ) -> Result<Option<ScriptExecution>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM script_tasks WHERE id = $1 AND is_deleted = false FOR SHARE",
        )
        .bind(dto.script_task_id)
        .fetch_optional(&mut *tx)
        .await?;
        if task.is_none() {
            return Ok(None);
        }

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO script_executions (script_task_id, status_id, input_parameters) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(dto.script_task_id)
        .bind(EXECUTION_RUNNING)
        .bind(&dto.input_parameters)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM {JOIN} WHERE se.id = $1");
        let execution = sqlx::query_as::<_, ScriptExecution>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(execution))
    }

    /// Find an execution by its ID, even if its task has since been deleted.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ScriptExecution>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {JOIN} WHERE se.id = $1");
        sqlx::query_as::<_, ScriptExecution>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List executions, most recently started first.
    pub async fn list(
        pool: &PgPool,
        filter: &ScriptExecutionFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<ScriptExecution>, sqlx::Error> {
        let count_query = format!("SELECT COUNT(*) FROM {JOIN} WHERE {LIVE} AND {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.script_task_id)
            .bind(&filter.status)
            .fetch_one(pool)
            .await?;

        let pagination = PageInfo::resolve(page, page_size, total);
        let query = format!(
            "SELECT {COLUMNS} FROM {JOIN} WHERE {LIVE} AND {FILTER} \
             ORDER BY se.started_at DESC, se.id \
             LIMIT $3 OFFSET $4"
        );
        let items = sqlx::query_as::<_, ScriptExecution>(&query)
            .bind(filter.script_task_id)
            .bind(&filter.status)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page { items, pagination })
    }

    /// Whether `script_task_id` has an execution still running.
    pub async fn has_running<'e, E>(executor: E, script_task_id: DbId) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS(\
                SELECT 1 FROM script_executions \
                WHERE script_task_id = $1 AND status_id = $2\
            )",
        )
        .bind(script_task_id)
        .bind(EXECUTION_RUNNING)
        .fetch_one(executor)
        .await
    }

    /// Move a running execution to its terminal state and count the run on
    /// the parent task, in one transaction.
    ///
    /// Returns `false` (and changes nothing) if the execution is no longer
    /// running.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        result: &FinishScriptExecution,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE script_executions SET \
                status_id = $2, \
                output = $3, \
                error_message = $4, \
                execution_time = $5, \
                finished_at = now() \
             WHERE id = $1 AND status_id = $6 \
             RETURNING script_task_id",
        )
        .bind(id)
        .bind(result.status_id)
        .bind(&result.output)
        .bind(&result.error_message)
        .bind(result.execution_time)
        .bind(EXECUTION_RUNNING)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task_id) = task_id else {
            return Ok(false);
        };

        ScriptTaskRepo::record_run(&mut *tx, task_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Force a running execution to `failed` without counting a run.
    ///
    /// Used when the coordinator itself faults. Returns `false` if the
    /// execution was already terminal.
    pub async fn fail(pool: &PgPool, id: DbId, error_message: &str) -> Result<bool, sqlx::Error> {
        let rows_affected = sqlx::query(
            "UPDATE script_executions SET \
                status_id = $2, \
                error_message = $3, \
                finished_at = now() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(EXECUTION_FAILED)
        .bind(error_message)
        .bind(EXECUTION_RUNNING)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Fail every execution still marked running. Returns how many changed.
    ///
    /// Only safe at startup, before any new execution can be opened.
    pub async fn fail_orphaned(pool: &PgPool, error_message: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE script_executions SET \
                status_id = $1, \
                error_message = $2, \
                finished_at = now() \
             WHERE status_id = $3",
        )
        .bind(EXECUTION_FAILED)
        .bind(error_message)
        .bind(EXECUTION_RUNNING)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
