//! Decoding of Firestore's REST value encoding.
//!
//! Every field in a REST document is wrapped in a single-key union object
//! naming its type, e.g. `{"stringValue": "hi"}` or `{"integerValue": "42"}`
//! (64-bit integers travel as decimal strings). This module unwraps that
//! encoding into plain [`serde_json::Value`]s, recursively for maps and
//! arrays.

use serde_json::Value;

use crate::{FirestoreError, Result};

/// Decode one wrapped Firestore value into a plain JSON value.
pub fn decode(wrapped: &Value) -> Result<Value> {
    let object = wrapped.as_object().ok_or_else(|| {
        FirestoreError::Decode(format!("expected a typed value object, got {}", wrapped))
    })?;

    let (tag, inner) = object
        .iter()
        .next()
        .ok_or_else(|| FirestoreError::Decode("empty value object".to_string()))?;

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => match inner {
            Value::Bool(_) => Ok(inner.clone()),
            other => Err(FirestoreError::Decode(format!(
                "booleanValue holds non-boolean {}",
                other
            ))),
        },
        "integerValue" => decode_integer(inner),
        "doubleValue" => match inner {
            Value::Number(_) => Ok(inner.clone()),
            // Infinity and NaN travel as strings; they have no JSON
            // representation, so surface them as decode errors.
            other => Err(FirestoreError::Decode(format!(
                "doubleValue holds non-numeric {}",
                other
            ))),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "mapValue" => decode_map(inner),
        "arrayValue" => decode_array(inner),
        other => Err(FirestoreError::Decode(format!(
            "unsupported value type '{}'",
            other
        ))),
    }
}

fn decode_integer(inner: &Value) -> Result<Value> {
    match inner {
        // The REST encoding sends int64 as a decimal string.
        Value::String(text) => {
            let parsed: i64 = text.parse().map_err(|_| {
                FirestoreError::Decode(format!("integerValue '{}' is not an integer", text))
            })?;
            Ok(Value::from(parsed))
        }
        // The emulator occasionally sends a bare number; accept it.
        Value::Number(number) if number.is_i64() || number.is_u64() => Ok(inner.clone()),
        other => Err(FirestoreError::Decode(format!(
            "integerValue holds {}",
            other
        ))),
    }
}

fn decode_map(inner: &Value) -> Result<Value> {
    let mut decoded = serde_json::Map::new();
    if let Some(fields) = inner.get("fields").and_then(|v| v.as_object()) {
        for (key, wrapped) in fields {
            decoded.insert(key.clone(), decode(wrapped)?);
        }
    }
    Ok(Value::Object(decoded))
}

fn decode_array(inner: &Value) -> Result<Value> {
    let mut decoded = Vec::new();
    if let Some(values) = inner.get("values").and_then(|v| v.as_array()) {
        for wrapped in values {
            decoded.push(decode(wrapped)?);
        }
    }
    Ok(Value::Array(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode(&json!({ "nullValue": null })).unwrap(), json!(null));
        assert_eq!(decode(&json!({ "booleanValue": true })).unwrap(), json!(true));
        assert_eq!(decode(&json!({ "integerValue": "42" })).unwrap(), json!(42));
        assert_eq!(decode(&json!({ "doubleValue": 2.5 })).unwrap(), json!(2.5));
        assert_eq!(
            decode(&json!({ "stringValue": "hello" })).unwrap(),
            json!("hello")
        );
    }

    #[test]
    fn decodes_timestamps_and_references_as_strings() {
        assert_eq!(
            decode(&json!({ "timestampValue": "2024-01-10T08:00:00Z" })).unwrap(),
            json!("2024-01-10T08:00:00Z")
        );
        assert_eq!(
            decode(&json!({ "referenceValue": "projects/p/databases/(default)/documents/users/u1" }))
                .unwrap(),
            json!("projects/p/databases/(default)/documents/users/u1")
        );
    }

    #[test]
    fn decodes_geo_points_as_objects() {
        assert_eq!(
            decode(&json!({ "geoPointValue": { "latitude": 44.97, "longitude": -93.26 } })).unwrap(),
            json!({ "latitude": 44.97, "longitude": -93.26 })
        );
    }

    #[test]
    fn decodes_nested_maps_and_arrays() {
        let wrapped = json!({
            "mapValue": {
                "fields": {
                    "clips": {
                        "arrayValue": {
                            "values": [
                                { "integerValue": "1" },
                                { "integerValue": "2" }
                            ]
                        }
                    },
                    "music": {
                        "mapValue": {
                            "fields": {
                                "title": { "stringValue": "Original sound" }
                            }
                        }
                    }
                }
            }
        });

        let decoded = decode(&wrapped).unwrap();
        assert_eq!(
            decoded,
            json!({
                "clips": [1, 2],
                "music": { "title": "Original sound" }
            })
        );
    }

    #[test]
    fn decodes_empty_array_and_map() {
        assert_eq!(decode(&json!({ "arrayValue": {} })).unwrap(), json!([]));
        assert_eq!(decode(&json!({ "mapValue": {} })).unwrap(), json!({}));
    }

    #[test]
    fn accepts_bare_integer_numbers() {
        assert_eq!(decode(&json!({ "integerValue": 7 })).unwrap(), json!(7));
    }

    #[test]
    fn rejects_bad_integer_strings() {
        let result = decode(&json!({ "integerValue": "4.5" }));
        assert!(matches!(result, Err(FirestoreError::Decode(_))));
    }

    #[test]
    fn rejects_unknown_tags() {
        let result = decode(&json!({ "mysteryValue": 1 }));
        match result {
            Err(FirestoreError::Decode(message)) => assert!(message.contains("mysteryValue")),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unwrapped_values() {
        assert!(decode(&json!("bare string")).is_err());
        assert!(decode(&json!({})).is_err());
    }
}
