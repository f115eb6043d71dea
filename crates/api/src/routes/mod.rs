pub mod executions;
pub mod health;
pub mod projects;
pub mod scripts;
pub mod vehicles;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy (every path also answers with a trailing slash):
///
/// ```text
/// /system/scripts/                      list, create
/// /system/scripts/{id}/                 get, update, soft delete
/// /system/scripts/{id}/execute/         start an execution (POST)
/// /system/executions/                   list
/// /system/executions/{id}/              get
///
/// /projects/                            list, create
/// /projects/{id}/                       get, update, soft delete
/// /vehicles/                            list, create
/// /vehicles/{id}/                       get, update, soft delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/system",
            Router::new()
                .merge(scripts::router())
                .merge(executions::router()),
        )
        .merge(projects::router())
        .merge(vehicles::router())
}
