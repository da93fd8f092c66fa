//! Result Normalization
//!
//! Tools are black boxes; their raw output may be a structured artifact list,
//! a bare JSON object, plain text, or nothing at all. `normalize` turns any of
//! these into at least one `Artifact`.

use serde_json::{Map, Value};
use windsite_core::Artifact;

use crate::catalog::ToolIdentity;

/// Normalize a tool's raw output into artifacts. Never returns an empty list.
pub fn normalize(tool: ToolIdentity, raw: Value) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    collect(tool, raw, &mut artifacts);
    if artifacts.is_empty() {
        artifacts.push(placeholder(tool));
    }
    artifacts
}

fn collect(tool: ToolIdentity, raw: Value, out: &mut Vec<Artifact>) {
    match raw {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                collect(tool, item, out);
            }
        }
        Value::Object(mut map) => match map.remove("artifacts") {
            Some(Value::Array(items)) => {
                for item in items {
                    collect(tool, item, out);
                }
            }
            Some(other) => {
                map.insert("artifacts".to_string(), other);
                out.push(from_object(tool, map));
            }
            None => out.push(from_object(tool, map)),
        },
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => collect(tool, parsed, out),
            _ if text.trim().is_empty() => {}
            _ => out.push(Artifact::new(tool.artifact_type(), tool.title()).with_message(text)),
        },
        scalar => out.push(Artifact::new(tool.artifact_type(), tool.title()).with_data(scalar)),
    }
}

fn from_object(tool: ToolIdentity, map: Map<String, Value>) -> Artifact {
    // Already artifact-shaped: trust it.
    if map.get("type").and_then(Value::as_str).is_some() && map.get("title").and_then(Value::as_str).is_some() {
        if let Ok(artifact) = serde_json::from_value::<Artifact>(Value::Object(map.clone())) {
            return artifact;
        }
    }

    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    let title = text("title").unwrap_or_else(|| tool.title().to_string());
    let subtitle = text("subtitle").unwrap_or_default();
    let message = text("message").or_else(|| text("summary")).unwrap_or_default();

    Artifact::new(tool.artifact_type(), title)
        .with_subtitle(subtitle)
        .with_message(message)
        .with_data(Value::Object(map))
}

fn placeholder(tool: ToolIdentity) -> Artifact {
    Artifact::new(tool.artifact_type(), tool.title())
        .with_message(format!("{} completed without returning data.", tool.title()))
}
