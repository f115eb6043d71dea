//! Vehicle pipeline configuration helpers.
//!
//! A vehicle's `pipelines` column is a JSON array where each element is an
//! object keyed by the pipeline name, e.g. `[{"build": {...}}, {"flash": {...}}]`.

use serde_json::Value;

use crate::error::CoreError;

/// Names of all pipelines, taken from the first key of each non-empty entry.
pub fn pipeline_names(pipelines: &Value) -> Vec<String> {
    pipelines
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_object()?.keys().next().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Validate the shape of a `pipelines` value: an array of objects.
pub fn validate_pipelines(pipelines: &Value) -> Result<(), CoreError> {
    let entries = pipelines
        .as_array()
        .ok_or_else(|| CoreError::Validation("pipelines must be a JSON array".to_string()))?;

    if entries.iter().any(|entry| !entry.is_object()) {
        return Err(CoreError::Validation(
            "each pipeline entry must be a JSON object".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn names_skip_empty_entries() {
        let pipelines = json!([{"build": {"steps": 3}}, {}, {"flash": null}]);
        assert_eq!(pipeline_names(&pipelines), vec!["build", "flash"]);
    }

    #[test]
    fn names_of_non_array_is_empty() {
        assert!(pipeline_names(&json!(null)).is_empty());
        assert!(pipeline_names(&json!({"build": 1})).is_empty());
    }

    #[test]
    fn validation_rejects_bad_shapes() {
        assert!(validate_pipelines(&json!([])).is_ok());
        assert!(validate_pipelines(&json!([{"a": 1}])).is_ok());
        assert_matches!(validate_pipelines(&json!({"a": 1})), Err(CoreError::Validation(_)));
        assert_matches!(validate_pipelines(&json!(["a"])), Err(CoreError::Validation(_)));
    }
}
