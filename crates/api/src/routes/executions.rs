//! Route definitions for execution history endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::executions;
use crate::state::AppState;

/// Routes mounted under `/system`.
///
/// ```text
/// GET /executions/         -> list_executions
/// GET /executions/{id}/    -> get_execution
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/executions", get(executions::list_executions))
        .route("/executions/", get(executions::list_executions))
        .route("/executions/{id}", get(executions::get_execution))
        .route("/executions/{id}/", get(executions::get_execution))
}
