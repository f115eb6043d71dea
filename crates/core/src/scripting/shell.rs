//! Shell script runtime.
//!
//! Parameters become `export NAME="value"` lines ahead of the stored body,
//! and the file is launched with `bash <path>`.

use serde_json::{Map, Value};

use super::executor::{ScriptError, ScriptRuntime};
use crate::script_types::ScriptKind;
use crate::validation::is_valid_env_name;

/// Runtime for shell (bash) scripts.
#[derive(Debug, Clone)]
pub struct ShellRuntime {
    interpreter: String,
}

impl ShellRuntime {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for ShellRuntime {
    fn default() -> Self {
        Self::new("bash")
    }
}

impl ScriptRuntime for ShellRuntime {
    fn kind(&self) -> ScriptKind {
        ScriptKind::Shell
    }

    fn file_name(&self) -> &'static str {
        "script.sh"
    }

    fn needs_exec_bit(&self) -> bool {
        true
    }

    fn program(&self) -> &str {
        &self.interpreter
    }

    fn render(&self, content: &str, params: &Map<String, Value>) -> Result<String, ScriptError> {
        let mut script = String::from("#!/bin/bash\n# Parameters\n");

        for (name, value) in params {
            if !is_valid_env_name(name) {
                return Err(ScriptError::InvalidParameter(format!(
                    "'{name}' is not a valid shell variable name"
                )));
            }
            script.push_str(&format!(
                "export {name}=\"{}\"\n",
                escape_double_quoted(&coerce_to_string(value))
            ));
        }

        script.push_str("\n# Script\n");
        script.push_str(content);
        script.push('\n');
        Ok(script)
    }
}

/// String form of a parameter value: strings raw, everything else as compact JSON.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape a value for use inside a double-quoted bash word.
///
/// Inside double quotes only `\`, `"`, `$` and backtick keep a special
/// meaning; each is backslash-escaped so the value expands to itself.
pub fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn render_exports_parameters_in_order_before_body() {
        let script = ShellRuntime::default()
            .render(
                "echo \"$NAME\"",
                &params(json!({"NAME": "fleet", "COUNT": 3, "DRY_RUN": true})),
            )
            .expect("render");

        let name_at = script.find("export NAME=\"fleet\"").expect("NAME export");
        let count_at = script.find("export COUNT=\"3\"").expect("COUNT export");
        let dry_at = script.find("export DRY_RUN=\"true\"").expect("DRY_RUN export");
        let body_at = script.find("echo \"$NAME\"").expect("body");
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(name_at < count_at && count_at < dry_at && dry_at < body_at);
    }

    #[test]
    fn render_without_parameters_keeps_body_verbatim() {
        let body = "set -e\necho hello";
        let script = ShellRuntime::default()
            .render(body, &Map::new())
            .expect("render");
        assert!(!script.contains("export"));
        assert!(script.contains(body));
    }

    #[test]
    fn render_rejects_invalid_variable_names() {
        let result =
            ShellRuntime::default().render("true", &params(json!({"bad name; rm -rf /": "x"})));
        assert_matches!(result, Err(ScriptError::InvalidParameter(_)));
    }

    #[test]
    fn escape_neutralises_expansion_characters() {
        assert_eq!(escape_double_quoted(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_double_quoted("$(whoami)"), "\\$(whoami)");
        assert_eq!(escape_double_quoted("`id`"), "\\`id\\`");
        assert_eq!(escape_double_quoted(r"C:\temp"), r"C:\\temp");
        assert_eq!(escape_double_quoted("plain 'single'"), "plain 'single'");
    }

    #[test]
    fn coerce_non_strings_to_json_text() {
        assert_eq!(coerce_to_string(&json!("text")), "text");
        assert_eq!(coerce_to_string(&json!(1.5)), "1.5");
        assert_eq!(coerce_to_string(&json!(null)), "null");
        assert_eq!(coerce_to_string(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn escaped_values_reach_the_script_literally() {
        let runtime = ShellRuntime::default();
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(runtime.file_name());
        let script = runtime
            .render(
                "printf '%s' \"$PAYLOAD\"",
                &params(json!({"PAYLOAD": "a \"quoted\" $HOME `x` \\n"})),
            )
            .expect("render");
        std::fs::write(&path, script).expect("write script");

        let output = runtime.command(&path).output().await.expect("run bash");
        assert!(output.status.success());
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            "a \"quoted\" $HOME `x` \\n"
        );
    }
}
