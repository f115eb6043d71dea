//! Route definitions for script task endpoints.

use axum::routing::{get, post, MethodRouter};
use axum::Router;

use crate::handlers::scripts;
use crate::state::AppState;

/// Routes mounted under `/system`.
///
/// ```text
/// GET    /scripts/                 -> list_scripts
/// POST   /scripts/                 -> create_script
/// GET    /scripts/{id}/            -> get_script
/// PUT    /scripts/{id}/            -> update_script
/// DELETE /scripts/{id}/            -> delete_script
/// POST   /scripts/{id}/execute/    -> execute_script
/// ```
pub fn router() -> Router<AppState> {
    let collection = || -> MethodRouter<AppState> {
        get(scripts::list_scripts).post(scripts::create_script)
    };
    let item = || -> MethodRouter<AppState> {
        get(scripts::get_script)
            .put(scripts::update_script)
            .delete(scripts::delete_script)
    };

    Router::new()
        .route("/scripts", collection())
        .route("/scripts/", collection())
        .route("/scripts/{id}", item())
        .route("/scripts/{id}/", item())
        .route("/scripts/{id}/execute", post(scripts::execute_script))
        .route("/scripts/{id}/execute/", post(scripts::execute_script))
}
