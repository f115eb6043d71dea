//! Route definitions for project space endpoints.

use axum::routing::{get, MethodRouter};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// ```text
/// GET    /projects/         -> list_projects
/// POST   /projects/         -> create_project
/// GET    /projects/{id}/    -> get_project
/// PUT    /projects/{id}/    -> update_project
/// DELETE /projects/{id}/    -> delete_project
/// ```
pub fn router() -> Router<AppState> {
    let collection = || -> MethodRouter<AppState> {
        get(projects::list_projects).post(projects::create_project)
    };
    let item = || -> MethodRouter<AppState> {
        get(projects::get_project)
            .put(projects::update_project)
            .delete(projects::delete_project)
    };

    Router::new()
        .route("/projects", collection())
        .route("/projects/", collection())
        .route("/projects/{id}", item())
        .route("/projects/{id}/", item())
}
