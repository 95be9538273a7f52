use serde_json::json;
use serde_json::Value;

/// Body returned by `/is-ready` and `/update-data`.
pub fn version_body(version: Value) -> String {
    return json!({ "version": version }).to_string();
}

/// Chat reply body using the given generation's field name.
pub fn reply_body(field: &str, text: &str) -> String {
    let mut body = serde_json::Map::new();
    body.insert(field.to_string(), Value::String(text.to_string()));

    return Value::Object(body).to_string();
}
