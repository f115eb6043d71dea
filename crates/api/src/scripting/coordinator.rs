//! Central script execution coordinator.
//!
//! Validates an execute request, opens the `running` execution record, and
//! hands the actual run to a background task on a bounded worker pool.
//! Held in [`AppState`](crate::state::AppState) as an `Arc<ScriptCoordinator>`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fleetdesk_core::error::CoreError;
use fleetdesk_core::script_types::{ScriptKind, SCRIPT_STATUS_ACTIVE};
use fleetdesk_core::scripting::materializer::materialize;
use fleetdesk_core::scripting::registry::RuntimeRegistry;
use fleetdesk_core::scripting::runner::{self, RunOutcome, RunStatus};
use fleetdesk_core::scripting::status::{EXECUTION_FAILED, EXECUTION_SUCCESS, EXECUTION_TIMEOUT};
use fleetdesk_core::types::DbId;
use fleetdesk_core::validation::{validate_parameters, validate_shell_parameter_names};
use fleetdesk_db::models::script::{
    CreateScriptExecution, FinishScriptExecution, ScriptExecution, ScriptTask,
};
use fleetdesk_db::repositories::{ScriptExecutionRepo, ScriptTaskRepo};
use futures::FutureExt;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

use crate::config::ScriptingConfig;
use crate::error::{AppError, AppResult};

/// Error text for executions left running by a previous server process.
pub const INTERRUPTED_MESSAGE: &str = "Interrupted by server restart";

/// Runs stored script tasks in the background on a bounded pool.
///
/// Lifecycle of one execution:
/// 1. Load the task and check it is `active`.
/// 2. Validate the supplied parameters.
/// 3. Create the execution record (`running`) and return it to the caller.
/// 4. In the background, wait for a worker slot, then materialize, run and
///    record the outcome (`success` / `failed` / `timeout`), counting the
///    run on the task in the same transaction.
///
/// Any fault inside step 4, panics included, is recorded as `failed`.
pub struct ScriptCoordinator {
    pool: PgPool,
    runtimes: RuntimeRegistry,
    workspace_root: Option<PathBuf>,
    permits: Semaphore,
    tracker: TaskTracker,
}

impl ScriptCoordinator {
    pub fn new(pool: PgPool, config: &ScriptingConfig) -> Self {
        Self {
            pool,
            runtimes: RuntimeRegistry::new(&config.shell_bin, &config.python_bin),
            workspace_root: config.workspace_root.clone(),
            permits: Semaphore::new(config.max_concurrency.max(1)),
            tracker: TaskTracker::new(),
        }
    }

    /// Start a run of `script_task_id` with the given parameters.
    ///
    /// Returns the freshly created `running` execution; the run itself
    /// continues in the background.
    pub async fn execute(
        self: &Arc<Self>,
        script_task_id: DbId,
        parameters: Option<&Value>,
    ) -> AppResult<ScriptExecution> {
        let not_found = || CoreError::NotFound {
            entity: "ScriptTask",
            id: script_task_id,
        };

        let task = ScriptTaskRepo::find_by_id(&self.pool, script_task_id)
            .await?
            .ok_or_else(not_found)?;

        if task.status != SCRIPT_STATUS_ACTIVE {
            return Err(CoreError::Validation(format!(
                "Script '{}' is not active",
                task.name
            ))
            .into());
        }

        let params = validate_parameters(parameters)?;
        if ScriptKind::from_name(&task.script_type) == Some(ScriptKind::Shell) {
            validate_shell_parameter_names(&params)?;
        }

        // Opening the record and handing it to a supervisor happen on a
        // detached task: a dropped request must not leave a `running` row
        // that nothing will finish.
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.open_and_dispatch(task, params).await })
            .await
            .map_err(|e| AppError::InternalError(format!("Execution dispatch failed: {e}")))?
    }

    /// Create the `running` record and spawn its supervisor with no await
    /// point in between.
    async fn open_and_dispatch(
        self: Arc<Self>,
        task: ScriptTask,
        params: Map<String, Value>,
    ) -> AppResult<ScriptExecution> {
        let execution = ScriptExecutionRepo::create(
            &self.pool,
            &CreateScriptExecution {
                script_task_id: task.id,
                input_parameters: Value::Object(params.clone()),
            },
        )
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ScriptTask",
            id: task.id,
        })?;

        let execution_id = execution.id;
        let script_task_id = task.id;
        let script_type = task.script_type.clone();
        let coordinator = Arc::clone(&self);
        self.tracker.spawn(async move {
            coordinator.supervise(execution_id, task, params).await;
        });

        tracing::info!(
            %execution_id,
            %script_task_id,
            %script_type,
            "Script execution started"
        );

        Ok(execution)
    }

    /// Fail every execution a previous process left `running`.
    ///
    /// Call once at startup, before the server accepts requests.
    pub async fn recover_interrupted(&self) -> Result<u64, sqlx::Error> {
        let recovered = ScriptExecutionRepo::fail_orphaned(&self.pool, INTERRUPTED_MESSAGE).await?;
        if recovered > 0 {
            tracing::warn!(recovered, "Marked interrupted script executions as failed");
        }
        Ok(recovered)
    }

    /// Number of background runs not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work and wait up to `timeout` for in-flight runs.
    ///
    /// Returns `true` if every run finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let in_flight = self.tracker.len();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for running scripts to finish");
        }
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }

    /// Run one execution to completion, turning any fault into a `failed` record.
    async fn supervise(&self, execution_id: DbId, task: ScriptTask, params: Map<String, Value>) {
        let result = AssertUnwindSafe(self.run_to_completion(execution_id, &task, &params))
            .catch_unwind()
            .await;

        let fault = match result {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        tracing::error!(
            %execution_id,
            script_task_id = %task.id,
            error = %fault,
            "Script execution faulted"
        );

        match ScriptExecutionRepo::fail(&self.pool, execution_id, &fault).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    %execution_id,
                    "Execution was already terminal when the fault was recorded"
                );
            }
            Err(err) => {
                tracing::error!(%execution_id, error = %err, "Failed to record execution fault");
            }
        }
    }

    async fn run_to_completion(
        &self,
        execution_id: DbId,
        task: &ScriptTask,
        params: &Map<String, Value>,
    ) -> AppResult<()> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::InternalError("Script worker pool is closed".to_string()))?;

        let runtime = match self.runtimes.resolve(&task.script_type) {
            Ok(runtime) => runtime,
            Err(err) => {
                let finish = FinishScriptExecution {
                    status_id: EXECUTION_FAILED,
                    output: None,
                    error_message: Some(err.to_string()),
                    execution_time: None,
                };
                ScriptExecutionRepo::finish(&self.pool, execution_id, &finish).await?;
                tracing::warn!(%execution_id, error = %err, "Script type has no runtime");
                return Ok(());
            }
        };

        let artifact = materialize(
            runtime,
            &task.content,
            params,
            self.workspace_root.as_deref(),
        )
        .map_err(|e| AppError::InternalError(format!("Failed to prepare script: {e}")))?;

        let timeout = Duration::from_secs(u64::try_from(task.timeout).unwrap_or(1).max(1));
        tracing::debug!(
            %execution_id,
            kind = runtime.kind().name(),
            program = runtime.program(),
            script = %artifact.script_path().display(),
            timeout_secs = timeout.as_secs(),
            "Launching script"
        );
        let outcome = runner::run(runtime, &artifact, timeout).await;

        let workspace = artifact.workspace().to_path_buf();
        if let Err(err) = artifact.cleanup() {
            tracing::warn!(
                %execution_id,
                path = %workspace.display(),
                error = %err,
                "Failed to remove script workspace"
            );
        }

        let finish = finish_from_outcome(outcome);
        let status_id = finish.status_id;
        let recorded = ScriptExecutionRepo::finish(&self.pool, execution_id, &finish).await?;
        if recorded {
            tracing::info!(
                %execution_id,
                status_id,
                execution_time = ?finish.execution_time,
                "Script execution finished"
            );
        } else {
            tracing::warn!(%execution_id, "Execution was no longer running; outcome discarded");
        }
        Ok(())
    }
}

/// Map a runner outcome to the terminal record fields.
///
/// Empty stderr is stored as `NULL`; elapsed time is stored only when the
/// interpreter process was actually started.
fn finish_from_outcome(outcome: RunOutcome) -> FinishScriptExecution {
    let status_id = match outcome.status {
        RunStatus::Succeeded => EXECUTION_SUCCESS,
        RunStatus::Failed => EXECUTION_FAILED,
        RunStatus::TimedOut => EXECUTION_TIMEOUT,
    };

    FinishScriptExecution {
        status_id,
        output: Some(outcome.output),
        error_message: Some(outcome.error).filter(|e| !e.is_empty()),
        execution_time: outcome.spawned.then_some(outcome.elapsed_secs),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("Script coordinator panicked: {detail}"),
        None => "Script coordinator panicked".to_string(),
    }
}
