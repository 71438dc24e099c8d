//! Recursive flattener for configuration property trees.
//!
//! Objects recurse with `.<key>` appended to the path, scalars store their
//! literal text, everything else (arrays, null) stores its JSON text.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::ConfigPropsReport;

/// Flatten `value` into `out`, rooted at `prefix`.
///
/// An empty object contributes nothing; an empty array stores `"[]"`.
pub fn flatten_into(value: &Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Array(_) | Value::Null => {
            out.insert(prefix.to_string(), value.to_string());
        }
    }
}

pub fn flatten(value: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    flatten_into(value, "", &mut out);
    out
}

/// Flatten every `@ConfigurationProperties` bean under its prefix.
///
/// Beans sharing a prefix across contexts merge into one map; the later
/// context (by name) wins on a conflicting key.
pub fn flatten_config_props(report: &ConfigPropsReport) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for context in report.contexts.values() {
        for bean in context.beans.values() {
            flatten_into(&bean.properties, &bean.prefix, &mut out);
        }
    }
    out
}
