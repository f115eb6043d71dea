//! Input validation shared by the HTTP handlers and the execution coordinator.
//!
//! Every function returns [`CoreError::Validation`] with a message suitable
//! for showing to the API caller.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Maximum length of names (scripts, projects, vehicles).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a vehicle code.
pub const MAX_CODE_LEN: usize = 50;

/// Names that can be exported as shell environment variables.
static ENV_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Whether `name` is usable as a shell variable name.
pub fn is_valid_env_name(name: &str) -> bool {
    ENV_NAME_RE.is_match(name)
}

/// Require a non-blank value no longer than `max_len` characters.
pub fn validate_required(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

/// Require script content that is not only whitespace.
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("content must not be empty".to_string()));
    }
    Ok(())
}

/// Require `value` to be one of `allowed`.
pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Require a strictly positive timeout.
pub fn validate_timeout(timeout: i32) -> Result<(), CoreError> {
    if timeout <= 0 {
        return Err(CoreError::Validation(
            "timeout must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

/// Normalise an optional parameter payload into a key/value map.
///
/// Absent or `null` yields an empty map; anything other than a JSON object
/// is rejected.
pub fn validate_parameters(params: Option<&Value>) -> Result<Map<String, Value>, CoreError> {
    match params {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(CoreError::Validation(
            "parameters must be a JSON object".to_string(),
        )),
    }
}

/// Require every parameter name to be a valid shell variable name.
pub fn validate_shell_parameter_names(params: &Map<String, Value>) -> Result<(), CoreError> {
    match params.keys().find(|name| !is_valid_env_name(name)) {
        Some(bad) => Err(CoreError::Validation(format!(
            "parameter name '{bad}' must match [A-Za-z_][A-Za-z0-9_]*"
        ))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
