//! Route definitions for vehicle model endpoints.

use axum::routing::{get, MethodRouter};
use axum::Router;

use crate::handlers::vehicles;
use crate::state::AppState;

/// ```text
/// GET    /vehicles/         -> list_vehicles
/// POST   /vehicles/         -> create_vehicle
/// GET    /vehicles/{id}/    -> get_vehicle
/// PUT    /vehicles/{id}/    -> update_vehicle
/// DELETE /vehicles/{id}/    -> delete_vehicle
/// ```
pub fn router() -> Router<AppState> {
    let collection = || -> MethodRouter<AppState> {
        get(vehicles::list_vehicles).post(vehicles::create_vehicle)
    };
    let item = || -> MethodRouter<AppState> {
        get(vehicles::get_vehicle)
            .put(vehicles::update_vehicle)
            .delete(vehicles::delete_vehicle)
    };

    Router::new()
        .route("/vehicles", collection())
        .route("/vehicles/", collection())
        .route("/vehicles/{id}", item())
        .route("/vehicles/{id}/", item())
}
