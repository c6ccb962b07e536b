//! Image metadata normalization
//!
//! Turns a raw image descriptor into JSON that is always serializable.
//! Raw binary payloads are dropped, anything that has no JSON form is
//! stringified.

use serde_json::{Map, Number, Value};

use super::value::{format_float, RawValue};

/// Map keys holding raw binary payloads; removed from every mapping
pub const BINARY_PAYLOAD_KEYS: &[&str] = &["stream"];

/// Nesting depth below which lists and maps are kept as their text form
pub const MAX_DEPTH: usize = 64;

/// Normalize a raw image descriptor into JSON
///
/// Never fails. Lists and maps nested deeper than [`MAX_DEPTH`] are
/// stringified whole instead of walked.
pub fn normalize_image_metadata(descriptor: &RawValue) -> Value {
    to_json(descriptor, 0)
}

fn to_json(value: &RawValue, depth: usize) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Int(i) => Value::Number((*i).into()),
        RawValue::Float(f) => match Number::from_f64(*f) {
            Some(n) => Value::Number(n),
            None => Value::String(format_float(*f)),
        },
        RawValue::Str(s) => Value::String(s.clone()),
        RawValue::Map(_) | RawValue::List(_) if depth >= MAX_DEPTH => {
            Value::String(value.to_string())
        }
        RawValue::Map(map) => {
            let mut out = Map::new();
            for (key, item) in map {
                if BINARY_PAYLOAD_KEYS.contains(&key.as_str()) {
                    continue;
                }
                out.insert(key.clone(), to_json(item, depth + 1));
            }
            Value::Object(out)
        }
        RawValue::List(items) => {
            Value::Array(items.iter().map(|item| to_json(item, depth + 1)).collect())
        }
        RawValue::Bytes(_) | RawValue::Opaque { .. } => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn map(entries: Vec<(&str, RawValue)>) -> RawValue {
        RawValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn contains_key(value: &Value, needle: &str) -> bool {
        match value {
            Value::Object(map) => map
                .iter()
                .any(|(k, v)| k == needle || contains_key(v, needle)),
            Value::Array(items) => items.iter().any(|v| contains_key(v, needle)),
            _ => false,
        }
    }

    #[test]
    fn test_scalars_pass_through() {
        let descriptor = map(vec![
            ("width", RawValue::Int(640)),
            ("x0", RawValue::Float(72.5)),
            ("imagemask", RawValue::Bool(false)),
            ("name", RawValue::from("Im0")),
            ("decode", RawValue::Null),
        ]);
        let json = normalize_image_metadata(&descriptor);

        assert_eq!(json["width"], 640);
        assert_eq!(json["x0"], 72.5);
        assert_eq!(json["imagemask"], false);
        assert_eq!(json["name"], "Im0");
        assert!(json["decode"].is_null());
    }

    #[test]
    fn test_stream_removed_at_every_level() {
        let descriptor = map(vec![
            ("stream", RawValue::Bytes(vec![0xFF; 32])),
            (
                "smask",
                map(vec![
                    ("stream", RawValue::Bytes(vec![1, 2])),
                    ("width", RawValue::Int(2)),
                ]),
            ),
            (
                "alternates",
                RawValue::List(vec![map(vec![("stream", RawValue::Bytes(vec![3]))])]),
            ),
        ]);
        let json = normalize_image_metadata(&descriptor);

        assert!(!contains_key(&json, "stream"));
        assert_eq!(json["smask"]["width"], 2);
        assert!(serde_json::to_string(&json).is_ok());
    }

    #[test]
    fn test_opaque_and_binary_are_stringified() {
        let descriptor = map(vec![
            ("colorspace", RawValue::List(vec![RawValue::opaque("name", "/DeviceRGB")])),
            ("parent", RawValue::opaque("reference", "4 0 R")),
            ("thumbnail", RawValue::Bytes(vec![9; 5])),
            ("ratio", RawValue::Float(f64::NAN)),
        ]);
        let json = normalize_image_metadata(&descriptor);

        assert_eq!(json["colorspace"][0], "/DeviceRGB");
        assert_eq!(json["parent"], "4 0 R");
        assert_eq!(json["thumbnail"], "<binary 5 bytes>");
        assert_eq!(json["ratio"], "NaN");
    }

    #[test]
    fn test_deep_nesting_is_stringified() {
        let mut value = RawValue::Int(1);
        for _ in 0..MAX_DEPTH + 2 {
            value = RawValue::List(vec![value]);
        }
        let descriptor = map(vec![("name", RawValue::from("Im0")), ("decode", value)]);
        let json = normalize_image_metadata(&descriptor);

        assert_eq!(json["name"], "Im0");
        let mut cursor = &json["decode"];
        for _ in 0..MAX_DEPTH - 1 {
            cursor = &cursor[0];
        }
        let tail = cursor.as_str().unwrap();
        assert!(tail.starts_with("[[") && tail.contains('1'), "{}", tail);
        assert!(serde_json::to_string(&json).is_ok());
    }
}
