//! Vehicle model models and DTOs.

use fleetdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A vehicle definition belonging to a project space.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VehicleModel {
    pub id: DbId,
    #[serde(rename = "project_space")]
    pub project_space_id: DbId,
    /// Joined from `project_spaces.name`.
    pub project_space_name: String,
    pub name: String,
    pub code: String,
    pub module: String,
    pub description: Option<String>,
    /// JSON array of single-key pipeline objects.
    pub pipelines: serde_json::Value,
    /// Not stored; filled from `pipelines` after loading.
    #[sqlx(skip)]
    pub pipeline_names: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VehicleModel {
    /// Populate the derived `pipeline_names` field.
    pub fn with_pipeline_names(mut self) -> Self {
        self.pipeline_names = fleetdesk_core::vehicle::pipeline_names(&self.pipelines);
        self
    }
}

/// DTO for creating a vehicle model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateVehicleModel {
    #[serde(rename = "project_space")]
    pub project_space_id: Option<DbId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub module: Option<String>,
    pub description: Option<String>,
    pub pipelines: Option<serde_json::Value>,
}

/// DTO for updating a vehicle model. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVehicleModel {
    #[serde(rename = "project_space")]
    pub project_space_id: Option<DbId>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub module: Option<String>,
    pub description: Option<String>,
    pub pipelines: Option<serde_json::Value>,
}

/// Filters for listing vehicle models.
#[derive(Debug, Clone, Default)]
pub struct VehicleModelFilter {
    pub project_space_id: Option<DbId>,
    pub name: Option<String>,
    pub code: Option<String>,
}
