//! # Gantry Core
//!
//! Wire model codec and resource identities shared by the Google Cloud
//! REST clients in `gantry-gcp`.
//!
//! The [`wire`] module maps domain records to the JSON shapes Google APIs
//! expect: lowerCamelCase keys, `"<seconds>s"` durations, Zulu timestamps,
//! base64 payloads and upper-snake enum constants. [`ResourceIdentity`]
//! models the hierarchical resource names used in request paths.

pub mod error;
pub mod identity;
pub mod wire;

// Re-export commonly used types
pub use error::{DecodeError, DecodeErrorKind, EncodeError, IdentityError, UnknownEnumValue};
pub use identity::ResourceIdentity;
pub use wire::{Field, FieldMask, WireEnum};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
