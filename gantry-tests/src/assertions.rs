//! Custom assertions for wire shapes and captured requests

use gantry_core::wire;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use wiremock::Request;

/// `decode(encode(x)) != x`, or one of the two steps failed
#[derive(Debug, thiserror::Error)]
pub enum RoundTripInvariantViolation {
    #[error("encoding failed: {0}")]
    Encode(#[from] gantry_core::EncodeError),

    #[error("decoding the encoded value failed: {0}")]
    Decode(#[from] gantry_core::DecodeError),

    #[error("round trip changed the value\n  before: {before}\n  after:  {after}")]
    Mismatch { before: String, after: String },
}

/// Check that a value survives encode then decode unchanged
pub fn check_round_trip<T>(value: &T) -> Result<(), RoundTripInvariantViolation>
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let encoded = wire::encode(value)?;
    let decoded: T = wire::decode_value(encoded)?;
    if &decoded != value {
        return Err(RoundTripInvariantViolation::Mismatch {
            before: format!("{:?}", value),
            after: format!("{:?}", decoded),
        });
    }
    Ok(())
}

/// Panicking form of [`check_round_trip`]
pub fn assert_round_trip<T>(value: &T)
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    if let Err(e) = check_round_trip(value) {
        panic!("round trip invariant violated: {}", e);
    }
}

/// Assert the request carried `Authorization: Bearer <token>`
pub fn assert_bearer(request: &Request, token: &str) {
    let header = request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    assert_eq!(
        header,
        Some(format!("Bearer {}", token).as_str()),
        "Expected bearer token on {} {}",
        request.method,
        request.url
    );
}

/// Parse a captured request body as JSON
pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or_else(|e| {
        panic!(
            "Expected JSON body on {} {}: {}",
            request.method, request.url, e
        )
    })
}

/// Assert a query parameter's value
pub fn assert_query(request: &Request, name: &str, expected: &str) {
    let value = request
        .url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned());
    assert_eq!(
        value.as_deref(),
        Some(expected),
        "Expected query parameter '{}' on {}",
        name,
        request.url
    );
}
