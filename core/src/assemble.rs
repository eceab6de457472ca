//! URL assembly.
//!
//! Default ports are always dropped (443 for https, 80 for http) and every
//! other port is always written. Query parameters keep the insertion order of
//! the merged map; `null` entries are skipped.

use serde_json::Value;

use crate::request::{Params, Request};

/// The fully qualified URL of `request`.
pub fn assemble(request: &Request) -> String {
    let mut url = request.origin().clone();
    url.set_path(request.path());
    let query = query_string(request.query_parameters());
    url.set_query((!query.is_empty()).then_some(query.as_str()));
    url.to_string()
}

/// Percent-encoded `key=value` pairs joined with `&`.
pub fn query_string(params: &Params) -> String {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = render(value)?;
            Some(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            ))
        })
        .collect::<Vec<_>>()
        .join("&")
}

// Arrays become comma-separated lists.
fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(items.iter().filter_map(render).collect::<Vec<_>>().join(",")),
        other => Some(other.to_string()),
    }
}
