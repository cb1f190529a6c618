use serde_json::Value;

/// Convert a JSON scalar into a sanitized string.
///
/// Returns `None` for `null`, objects and arrays.
pub fn scalar_to_string(value: Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Object(_) | Value::Array(_) => return None,
    };
    Some(sanitize(raw))
}

fn sanitize(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}
