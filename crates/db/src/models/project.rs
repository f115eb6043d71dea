//! Project space models and DTOs.

use fleetdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project space grouping vehicle models.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectSpace {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    pub description: Option<String>,
    /// Number of non-deleted vehicles in the project.
    pub vehicle_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a project space.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProjectSpace {
    #[serde(default)]
    pub name: String,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

/// DTO for updating a project space. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectSpace {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

/// Filters for listing project spaces.
#[derive(Debug, Clone, Default)]
pub struct ProjectSpaceFilter {
    pub is_active: Option<bool>,
    pub name: Option<String>,
}
