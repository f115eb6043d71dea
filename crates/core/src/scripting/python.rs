//! Python script runtime.
//!
//! The parameter mapping is rendered as a Python literal bound to a single
//! `PARAMS` constant ahead of the stored body, and the file is launched with
//! `python3 <path>`.

use serde_json::{Map, Value};

use super::executor::{ScriptError, ScriptRuntime};
use crate::script_types::ScriptKind;

/// Indentation unit used when rendering `PARAMS`.
const INDENT: &str = "  ";

/// Runtime for Python scripts.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    interpreter: String,
}

impl PythonRuntime {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl ScriptRuntime for PythonRuntime {
    fn kind(&self) -> ScriptKind {
        ScriptKind::Python
    }

    fn file_name(&self) -> &'static str {
        "script.py"
    }

    fn program(&self) -> &str {
        &self.interpreter
    }

    fn render(&self, content: &str, params: &Map<String, Value>) -> Result<String, ScriptError> {
        let mut literal = String::new();
        write_object(&mut literal, params, 0);

        Ok(format!(
            "#!/usr/bin/env python3\n\
             # -*- coding: utf-8 -*-\n\
             import json\n\
             import os\n\
             import sys\n\
             \n\
             # Parameters\n\
             PARAMS = {literal}\n\
             \n\
             # Script\n\
             {content}\n"
        ))
    }
}

/// Render a JSON value as an equivalent Python literal.
///
/// Strings reuse JSON escaping, which Python string literals accept as-is;
/// non-ASCII characters are kept unescaped.
pub fn python_literal(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&Value::String(s.clone()).to_string()),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&INDENT.repeat(depth + 1));
                write_value(out, item, depth + 1);
            }
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
        Value::Object(map) => write_object(out, map, depth),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>, depth: usize) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (i, (key, item)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(&INDENT.repeat(depth + 1));
        out.push_str(&Value::String(key.clone()).to_string());
        out.push_str(": ");
        write_value(out, item, depth + 1);
    }
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
