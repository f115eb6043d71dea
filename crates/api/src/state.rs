use std::sync::Arc;

use crate::config::ServerConfig;
use crate::scripting::coordinator::ScriptCoordinator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fleetdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Background script execution coordinator.
    pub coordinator: Arc<ScriptCoordinator>,
}

impl AppState {
    /// Build the state, creating the coordinator from `config.scripting`.
    pub fn new(pool: fleetdesk_db::DbPool, config: ServerConfig) -> Self {
        let coordinator = Arc::new(ScriptCoordinator::new(pool.clone(), &config.scripting));
        Self {
            pool,
            config: Arc::new(config),
            coordinator,
        }
    }
}
