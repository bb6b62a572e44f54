//! Decoder for JSON documents describing a decoded message object graph.
//!
//! Plain JSON values map directly onto [`Value`]:
//!
//! | JSON                      | Value                                   |
//! |---------------------------|-----------------------------------------|
//! | `null`                    | `None`                                  |
//! | `true` / `false`          | `Int(1)` / `Int(0)`                     |
//! | integer / other number    | `Int` / `Float`                         |
//! | string                    | `Str`                                   |
//! | array                     | `List`                                  |
//! | object                    | `Object` (attribute per key)            |
//!
//! A few single-key objects are tags for values JSON cannot express:
//!
//! - `{"$base64": "..."}`: bytes
//! - `{"$timestamp": 1700000000.0}`: date object with a `timestamp()` method
//! - `{"$call": <value>}`: zero-argument method returning `<value>`
//! - `{"$error": "message"}`: attribute whose lookup raises

use std::path::Path;

use base64::Engine as _;
use tracing::debug;

use super::decoder::{Decoder, DecoderLoader};
use super::object::{DynMessage, DynObject, ForeignMessage, TimestampObject};
use super::value::{ForeignError, Value};

const TAG_BASE64: &str = "$base64";
const TAG_TIMESTAMP: &str = "$timestamp";
const TAG_CALL: &str = "$call";
const TAG_ERROR: &str = "$error";

/// Opens `.json` message documents from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn name(&self) -> &str {
        "json"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ForeignMessage>, ForeignError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ForeignError::new(format!("cannot read file: {e}")))?;
        let message = parse_document(&text)?;
        Ok(Box::new(message))
    }
}

/// The JSON decoder has no external requirements and always loads.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoader;

impl DecoderLoader for JsonLoader {
    fn load(&self) -> Result<Box<dyn Decoder>, ForeignError> {
        Ok(Box::new(JsonDecoder))
    }
}

/// Parse a JSON document into a decoded message.
///
/// The top level must be a JSON object.
pub fn parse_document(text: &str) -> Result<DynMessage, ForeignError> {
    let doc: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ForeignError::new(format!("not a message document: {e}")))?;
    match doc {
        serde_json::Value::Object(map) => Ok(DynMessage::new(convert_object(&map))),
        other => Err(ForeignError::new(format!(
            "not a message document: top level is {}",
            json_kind(&other)
        ))),
    }
}

fn convert_object(map: &serde_json::Map<String, serde_json::Value>) -> DynObject {
    let mut obj = DynObject::new();
    for (name, json) in map {
        match convert_attr(json) {
            Ok(value) => obj.set(name, value),
            Err(e) => obj.set_error(name, &e.0),
        }
    }
    obj
}

/// Convert an attribute value; `$error` tags become raising attributes.
fn convert_attr(json: &serde_json::Value) -> Result<Value, ForeignError> {
    if let Some(message) = tagged(json, TAG_ERROR) {
        return Err(ForeignError::new(
            message.as_str().unwrap_or("foreign error").to_string(),
        ));
    }
    Ok(convert_value(json))
}

fn convert_value(json: &serde_json::Value) -> Value {
    use serde_json::Value as J;

    match json {
        J::Null => Value::None,
        J::Bool(b) => Value::Int(i64::from(*b)),
        J::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or_default(),
        },
        J::String(s) => Value::Str(s.clone()),
        J::Array(items) => Value::List(items.iter().map(convert_value).collect()),
        J::Object(map) => {
            if let Some(encoded) = tagged(json, TAG_BASE64) {
                return decode_base64(encoded);
            }
            if let Some(seconds) = tagged(json, TAG_TIMESTAMP) {
                return match seconds.as_f64() {
                    Some(s) => Value::object(TimestampObject::new(s)),
                    None => Value::None,
                };
            }
            if let Some(inner) = tagged(json, TAG_CALL) {
                let result = convert_attr(inner);
                return Value::callable(move || result.clone());
            }
            if tagged(json, TAG_ERROR).is_some() {
                // Only meaningful as an attribute; nested, it reads as null.
                return Value::None;
            }
            Value::object(convert_object(map))
        }
    }
}

/// Payload of a single-key tag object `{"<tag>": payload}`.
fn tagged<'a>(json: &'a serde_json::Value, tag: &str) -> Option<&'a serde_json::Value> {
    match json {
        serde_json::Value::Object(map) if map.len() == 1 => map.get(tag),
        _ => None,
    }
}

fn decode_base64(encoded: &serde_json::Value) -> Value {
    let Some(text) = encoded.as_str() else {
        return Value::None;
    };
    match base64::engine::general_purpose::STANDARD.decode(text.trim()) {
        Ok(bytes) => Value::Bytes(bytes),
        Err(e) => {
            debug!(error = %e, "Invalid base64 payload in message document");
            Value::None
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foreign::object::ForeignObject;

    #[test]
    fn test_scalar_attributes() {
        let msg = parse_document(r#"{"subject": "Hi", "size": 12, "flag": true, "x": null}"#)
            .unwrap();
        assert_eq!(msg.getattr("subject").unwrap().coerce_text().as_deref(), Some("Hi"));
        assert!(matches!(msg.getattr("size"), Ok(Value::Int(12))));
        assert!(matches!(msg.getattr("flag"), Ok(Value::Int(1))));
        assert!(msg.getattr("x").unwrap().is_none());
        assert!(msg.getattr("missing").is_err());
    }

    #[test]
    fn test_tagged_values() {
        let msg = parse_document(
            r#"{
                "htmlBody": {"$base64": "PGI+aGk8L2I+"},
                "date": {"$timestamp": 86400},
                "data": {"$call": {"$base64": "AAE="}},
                "cc": {"$error": "property failed"}
            }"#,
        )
        .unwrap();

        assert_eq!(
            msg.getattr("htmlBody").unwrap().coerce_bytes(),
            Some(b"<b>hi</b>".to_vec())
        );

        let Value::Object(date) = msg.getattr("date").unwrap() else {
            panic!("date should be an object");
        };
        assert_eq!(date.to_text().as_deref(), Some("1970-01-02T00:00:00+00:00"));

        let Value::Callable(data) = msg.getattr("data").unwrap() else {
            panic!("data should be callable");
        };
        assert_eq!(data().unwrap().coerce_bytes(), Some(vec![0, 1]));

        assert_eq!(
            msg.getattr("cc").unwrap_err(),
            ForeignError::new("property failed")
        );
    }

    #[test]
    fn test_nested_objects_and_lists() {
        let msg = parse_document(r#"{"recipients": [{"type": 1, "email": "a@x.com"}, 5]}"#)
            .unwrap();
        let Value::List(items) = msg.getattr("recipients").unwrap() else {
            panic!("recipients should be a list");
        };
        assert_eq!(items.len(), 2);
        let Value::Object(first) = &items[0] else {
            panic!("first recipient should be an object");
        };
        assert!(matches!(first.getattr("type"), Ok(Value::Int(1))));
        assert!(matches!(items[1], Value::Int(5)));
    }

    #[test]
    fn test_rejects_non_object_document() {
        let err = parse_document("[1, 2]").unwrap_err();
        assert!(err.0.contains("an array"));
        assert!(parse_document("not json").is_err());
    }

    #[test]
    fn test_invalid_base64_is_null() {
        let msg = parse_document(r#"{"data": {"$base64": "%%%"}}"#).unwrap();
        assert!(msg.getattr("data").unwrap().is_none());
    }
}
