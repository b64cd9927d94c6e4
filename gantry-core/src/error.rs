//! Error types for the wire codec and resource identities

use std::fmt;

/// Classification of a decode failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// An enum field carried a wire string that is not a declared member
    UnknownEnumValue,
    /// A required field was absent from the payload
    MissingField,
    /// Anything else: wrong JSON type, bad scalar encoding, invalid JSON
    Malformed,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::UnknownEnumValue => "unknown enum value",
            Self::MissingField => "missing field",
            Self::Malformed => "malformed payload",
        };
        f.write_str(kind)
    }
}

/// A response body did not match the expected shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode {shape}: {kind}: {message}")]
pub struct DecodeError {
    /// Rust type name of the target shape
    pub shape: &'static str,
    pub kind: DecodeErrorKind,
    pub message: String,
}

impl DecodeError {
    pub fn new(shape: &'static str, kind: DecodeErrorKind, message: impl Into<String>) -> Self {
        Self {
            shape,
            kind,
            message: message.into(),
        }
    }

    /// Build from a `serde_json` failure, classifying it by serde's
    /// standard error messages.
    pub fn from_json(shape: &'static str, err: &serde_json::Error) -> Self {
        let message = err.to_string();
        // Depends on serde's message text: `de::Error::unknown_variant` and
        // `de::Error::missing_field` render as "unknown variant ..." and
        // "missing field ...". `wire_enum!` visitors report through
        // `unknown_variant`, so enums classify correctly. If serde ever
        // rewords these, the tests below and in `wire::enums` catch it.
        let kind = if message.starts_with("unknown variant") {
            DecodeErrorKind::UnknownEnumValue
        } else if message.starts_with("missing field") {
            DecodeErrorKind::MissingField
        } else {
            DecodeErrorKind::Malformed
        };
        Self::new(shape, kind, message)
    }

    pub fn is_unknown_enum_value(&self) -> bool {
        self.kind == DecodeErrorKind::UnknownEnumValue
    }
}

/// A domain object could not be turned into wire JSON
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to encode {shape}: {message}")]
pub struct EncodeError {
    pub shape: &'static str,
    pub message: String,
}

impl EncodeError {
    pub fn new(shape: &'static str, message: impl Into<String>) -> Self {
        Self {
            shape,
            message: message.into(),
        }
    }
}

/// A wire string is not among an enum's declared values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {enum_name} value '{value}'")]
pub struct UnknownEnumValue {
    pub enum_name: &'static str,
    pub value: String,
}

/// Invalid hierarchical resource path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("resource path is empty")]
    Empty,

    #[error("resource path '{0}' has an odd number of segments")]
    OddSegments(String),

    #[error("resource path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("resource segment '{0}' may only contain letters, digits, '-', '_', '.', '~' or '+'")]
    InvalidSegment(String),

    #[error("resource path '{path}' is not in collection '{expected}'")]
    UnexpectedCollection { path: String, expected: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Shape {
        name: String,
    }

    #[test]
    fn classifies_missing_field() {
        let err = serde_json::from_str::<Shape>("{}").unwrap_err();
        let decode = DecodeError::from_json("Shape", &err);
        assert_eq!(decode.kind, DecodeErrorKind::MissingField);
        assert_eq!(decode.shape, "Shape");
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    enum Mode {
        On,
    }

    #[test]
    fn classifies_unknown_variant() {
        let err = serde_json::from_str::<Mode>(r#""Off""#).unwrap_err();
        let decode = DecodeError::from_json("Mode", &err);
        assert!(decode.is_unknown_enum_value());
    }

    #[test]
    fn classifies_type_mismatch_as_malformed() {
        let err = serde_json::from_str::<Shape>(r#"{"name": 3}"#).unwrap_err();
        let decode = DecodeError::from_json("Shape", &err);
        assert_eq!(decode.kind, DecodeErrorKind::Malformed);
    }
}
