//! WireModel codec
//!
//! Domain records derive `Serialize`/`Deserialize` with
//! `#[serde(rename_all = "camelCase")]` and use the adapters in this module
//! for scalars that Google's JSON mapping encodes as strings:
//!
//! - [`Seconds`] for `std::time::Duration` (`"864000s"`)
//! - [`Zulu`] for `chrono::DateTime<Utc>` (`"2024-01-02T03:04:05Z"`)
//! - [`Base64`] for binary payloads
//! - [`wire_enum!`](crate::wire_enum) for upper-snake enum constants
//!
//! Optional fields use [`Field`] so that unset keys are omitted while
//! explicit nulls survive.

mod bytes;
mod duration;
mod enums;
mod field;
mod timestamp;

pub use bytes::{decode_bytes, encode_bytes, Base64};
pub use duration::{format_duration, parse_duration, Seconds};
pub use enums::{WireEnum, WireEnumVisitor};
pub use field::Field;
pub use timestamp::{format_timestamp, parse_timestamp, Zulu};

use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Top-level wire keys present in a partial encoding.
///
/// Renders as the comma-separated form used by `updateMask` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask(Vec<String>);

impl FieldMask {
    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

fn shape_name<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

/// Encode a domain object into wire JSON
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodeError> {
    serde_json::to_value(value).map_err(|e| EncodeError::new(shape_name::<T>(), e.to_string()))
}

/// Encode only the fields the caller set, dropping `exclude`d top-level keys.
///
/// Unset [`Field`]s never reach the output, so the returned mask lists
/// exactly the keys a PATCH should touch.
pub fn encode_partial<T: Serialize + ?Sized>(
    value: &T,
    exclude: &[&str],
) -> Result<(Value, FieldMask), EncodeError> {
    let mut encoded = encode(value)?;
    let object = encoded.as_object_mut().ok_or_else(|| {
        EncodeError::new(shape_name::<T>(), "partial encoding requires a JSON object")
    })?;

    for key in exclude {
        object.remove(*key);
    }
    let mut paths: Vec<String> = object.keys().cloned().collect();
    paths.sort();

    Ok((encoded, FieldMask(paths)))
}

/// Serialize straight to bytes for a request body
pub fn encode_to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(value).map_err(|e| EncodeError::new(shape_name::<T>(), e.to_string()))
}

/// Decode a response body into `T`
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::new(
            shape_name::<T>(),
            DecodeErrorKind::Malformed,
            "empty response body",
        ));
    }
    serde_json::from_slice(body).map_err(|e| DecodeError::from_json(shape_name::<T>(), &e))
}

/// Decode an already-parsed JSON value into `T`
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::from_json(shape_name::<T>(), &e))
}

/// `task_ttl` → `taskTtl`
pub fn to_lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use serde_with::serde_as;
    use std::time::Duration;

    crate::wire_enum! {
        enum Encoding {
            Unspecified = "ENCODING_UNSPECIFIED",
            Json = "JSON",
            Binary = "BINARY",
        }
    }

    #[serde_as]
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Settings {
        name: String,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        encoding: Field<Encoding>,
        #[serde_as(as = "Field<Seconds>")]
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        retention: Field<Duration>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        first_revision_id: Field<String>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        last_revision_id: Field<String>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        satisfies_pzs: Field<bool>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Node>,
    }

    // Mutually nested shapes: Settings -> Node -> Settings
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Node {
        label: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        settings: Vec<Settings>,
    }

    fn minimal(name: &str) -> Settings {
        Settings {
            name: name.to_string(),
            encoding: Field::Unset,
            retention: Field::Unset,
            first_revision_id: Field::Unset,
            last_revision_id: Field::Unset,
            satisfies_pzs: Field::Unset,
            children: vec![],
        }
    }

    #[test]
    fn partial_encoding_keeps_only_set_keys() {
        let mut settings = minimal("topics/t1");
        settings.encoding = Encoding::Json.into();
        settings.retention = Duration::from_secs(600).into();

        let value = encode(&settings).unwrap();
        assert_eq!(
            value,
            json!({ "name": "topics/t1", "encoding": "JSON", "retention": "600s" })
        );
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn encode_partial_excludes_and_masks() {
        let mut settings = minimal("topics/t1");
        settings.satisfies_pzs = true.into();
        settings.first_revision_id = Field::Null;

        let (value, mask) = encode_partial(&settings, &["name"]).unwrap();
        assert_eq!(value, json!({ "firstRevisionId": null, "satisfiesPzs": true }));
        assert!(mask.contains("satisfiesPzs"));
        assert!(mask.contains("firstRevisionId"));
        assert!(!mask.contains("name"));
        assert_eq!(mask.paths().len(), 2);
    }

    #[test]
    fn encode_partial_rejects_non_objects() {
        assert!(encode_partial(&vec![1, 2], &[]).is_err());
    }

    #[test]
    fn nested_recursive_shapes_round_trip() {
        let mut leaf = minimal("leaf");
        leaf.encoding = Encoding::Binary.into();
        let mut root = minimal("root");
        root.retention = Duration::from_millis(1500).into();
        root.children = vec![Node {
            label: "n1".to_string(),
            settings: vec![leaf],
        }];

        let bytes = encode_to_vec(&root).unwrap();
        let decoded: Settings = decode(&bytes).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn decode_reports_missing_required_field() {
        let err = decode::<Settings>(br#"{"encoding": "JSON"}"#).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::MissingField);
        assert!(err.shape.ends_with("Settings"));
    }

    #[test]
    fn decode_rejects_empty_body() {
        let err = decode::<Settings>(b"  ").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Malformed);
    }

    #[test]
    fn decode_rejects_bad_duration() {
        let err = decode::<Settings>(br#"{"name": "x", "retention": "ten minutes"}"#).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Malformed);
    }

    #[test]
    fn lower_camel_conversion() {
        assert_eq!(to_lower_camel("task_ttl"), "taskTtl");
        assert_eq!(to_lower_camel("max_dispatches_per_second"), "maxDispatchesPerSecond");
        assert_eq!(to_lower_camel("name"), "name");
        assert_eq!(to_lower_camel("_private"), "private");
    }
}
