use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed block payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Inverse of [`crate::encode`]: parse one block payload back into the value
/// model. For every acyclic tree `v`, `decode(&encode(&v))` reproduces `v`.
pub fn decode(payload: &str) -> Result<Value, DecodeError> {
    let parsed: JsonValue = serde_json::from_str(payload)?;
    Ok(from_json(parsed))
}

fn from_json(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(-1.0)),
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(items) => {
            let list = Value::list();
            for item in items {
                list.push(from_json(item));
            }
            Value::List(list)
        }
        JsonValue::Object(fields) => {
            let map = Value::map();
            for (key, item) in fields {
                map.insert(key, from_json(item));
            }
            Value::Map(map)
        }
    }
}
