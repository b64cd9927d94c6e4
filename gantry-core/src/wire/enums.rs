//! Enums encoded as upper-snake wire constants

use crate::error::UnknownEnumValue;
use serde::de::{self, Visitor};
use std::fmt;
use std::marker::PhantomData;

/// An enum whose members map one-to-one onto wire strings.
///
/// Every wire enum has a `*_UNSPECIFIED` zero member, which is also its
/// `Default`. Implementations are generated by [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Sized + Copy + 'static {
    /// Rust type name, used in error messages
    const NAME: &'static str;
    /// The `*_UNSPECIFIED` zero member
    const UNSPECIFIED: Self;
    /// All declared wire strings, zero member first
    const VARIANTS: &'static [&'static str];

    fn as_wire_str(&self) -> &'static str;

    /// Strict lookup; unknown strings are an error.
    fn from_wire_str(value: &str) -> Result<Self, UnknownEnumValue>;
}

/// Visitor shared by every generated `Deserialize` impl
#[doc(hidden)]
pub struct WireEnumVisitor<E>(PhantomData<E>);

impl<E> WireEnumVisitor<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for WireEnumVisitor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: WireEnum> Visitor<'_> for WireEnumVisitor<E> {
    type Value = E;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a {} wire string", E::NAME)
    }

    fn visit_str<DE: de::Error>(self, value: &str) -> Result<E, DE> {
        E::from_wire_str(value).map_err(|_| DE::unknown_variant(value, E::VARIANTS))
    }
}

/// Declare a wire enum.
///
/// The first member is the `*_UNSPECIFIED` zero value and becomes the
/// `Default`. Generates `Serialize`/`Deserialize` through the wire strings,
/// plus `Display` and `FromStr`.
///
/// ```
/// gantry_core::wire_enum! {
///     /// State of a queue
///     pub enum QueueState {
///         Unspecified = "STATE_UNSPECIFIED",
///         Running = "RUNNING",
///         Paused = "PAUSED",
///     }
/// }
///
/// let state: QueueState = serde_json::from_str("\"RUNNING\"").unwrap();
/// assert_eq!(state, QueueState::Running);
/// assert_eq!(QueueState::default(), QueueState::Unspecified);
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(#[$umeta:meta])*
            $unspecified:ident = $unspecified_wire:literal,
            $( $(#[$vmeta:meta])* $variant:ident = $wire:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $(#[$umeta])*
            #[default]
            $unspecified,
            $( $(#[$vmeta])* $variant, )*
        }

        impl $crate::wire::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const UNSPECIFIED: Self = Self::$unspecified;
            const VARIANTS: &'static [&'static str] = &[$unspecified_wire $(, $wire)*];

            fn as_wire_str(&self) -> &'static str {
                match self {
                    Self::$unspecified => $unspecified_wire,
                    $( Self::$variant => $wire, )*
                }
            }

            fn from_wire_str(value: &str) -> ::std::result::Result<Self, $crate::UnknownEnumValue> {
                match value {
                    $unspecified_wire => Ok(Self::$unspecified),
                    $( $wire => Ok(Self::$variant), )*
                    other => Err($crate::UnknownEnumValue {
                        enum_name: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::wire::WireEnum::as_wire_str(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::UnknownEnumValue;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <Self as $crate::wire::WireEnum>::from_wire_str(s)
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_str($crate::wire::WireEnum::as_wire_str(self))
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                deserializer.deserialize_str($crate::wire::WireEnumVisitor::<Self>::new())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::wire;

    crate::wire_enum! {
        enum JobState {
            Unspecified = "STATE_UNSPECIFIED",
            Running = "RUNNING",
            Paused = "PAUSED",
            Disabled = "DISABLED",
        }
    }

    #[test]
    fn running_decodes_to_running_member() {
        let state: JobState = wire::decode_value(serde_json::json!("RUNNING")).unwrap();
        assert_eq!(state, JobState::Running);
    }

    #[test]
    fn unspecified_always_decodes() {
        let state: JobState = wire::decode_value(serde_json::json!("STATE_UNSPECIFIED")).unwrap();
        assert_eq!(state, JobState::UNSPECIFIED);
        assert_eq!(JobState::default(), JobState::Unspecified);
    }

    #[test]
    fn unknown_value_is_a_decode_error() {
        let err = wire::decode_value::<JobState>(serde_json::json!("HIBERNATING")).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::UnknownEnumValue);
        assert!(err.message.contains("HIBERNATING"));
    }

    #[test]
    fn from_str_reports_enum_name() {
        let err = "nope".parse::<JobState>().unwrap_err();
        assert_eq!(err.enum_name, "JobState");
        assert_eq!(err.value, "nope");
    }

    #[test]
    fn encodes_wire_string() {
        assert_eq!(
            serde_json::to_value(JobState::Paused).unwrap(),
            serde_json::json!("PAUSED")
        );
        assert_eq!(JobState::Disabled.to_string(), "DISABLED");
        assert_eq!(JobState::VARIANTS[0], "STATE_UNSPECIFIED");
    }
}
