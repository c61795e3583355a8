//! Query-string builder.
//!
//! Flattens a JSON object into `key=value` pairs:
//!
//! | Input                        | Output              |
//! |------------------------------|---------------------|
//! | `{"a": 1}`                   | `a=1`               |
//! | `{"b": [2, 3]}`              | `b[]=2&b[]=3`       |
//! | `{"f": {"x": "y"}}`          | `f[x]=y`            |
//! | `{"f": {"x": [1]}}`          | `f[x][]=1`          |
//! | `{"n": null}`                | (skipped)           |
//!
//! Nesting is followed two levels deep; a container found deeper than that is
//! emitted as compact JSON text. Key parts and values are percent-encoded,
//! brackets are not.

use crate::pattern::URI_COMPONENT;
use percent_encoding::utf8_percent_encode;
use serde_json::Value;

/// Maximum nesting followed below a top-level key.
pub const MAX_DEPTH: usize = 2;

/// Decides whether a `null` value is emitted (as `key=`). Receives the value
/// and the fully bracketed key.
pub type Nullable = dyn Fn(&Value, &str) -> bool + Send + Sync;

/// Build a query string (without the leading `?`) from a JSON value.
///
/// Objects contribute their keys in insertion order. A scalar or array at the
/// top level has no key to attach to and yields an empty string.
pub fn build_query(value: &Value, nullable: Option<&Nullable>) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            flatten(encode(key), value, 0, nullable, &mut pairs);
        }
    }
    pairs.join("&")
}

fn flatten(
    prefix: String,
    value: &Value,
    depth: usize,
    nullable: Option<&Nullable>,
    pairs: &mut Vec<String>,
) {
    match value {
        Value::Object(map) if depth < MAX_DEPTH => {
            for (key, value) in map {
                flatten(
                    format!("{prefix}[{}]", encode(key)),
                    value,
                    depth + 1,
                    nullable,
                    pairs,
                );
            }
        }
        Value::Array(items) if depth < MAX_DEPTH => {
            for item in items {
                flatten(format!("{prefix}[]"), item, depth + 1, nullable, pairs);
            }
        }
        Value::Null => {
            if nullable.is_some_and(|keep| keep(value, prefix.as_str())) {
                pairs.push(format!("{prefix}="));
            }
        }
        Value::String(s) => pairs.push(format!("{prefix}={}", encode(s))),
        Value::Bool(_) | Value::Number(_) => pairs.push(format!("{prefix}={value}")),
        Value::Object(_) | Value::Array(_) => {
            pairs.push(format!("{prefix}={}", encode(&value.to_string())))
        }
    }
}

fn encode(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}
