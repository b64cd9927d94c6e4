//! Tri-state optional field

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::de::DeserializeAsWrap;
use serde_with::ser::SerializeAsWrap;
use serde_with::{DeserializeAs, SerializeAs};

/// An optional wire field that distinguishes "not set" from "set to null".
///
/// Use with `#[serde(default, skip_serializing_if = "Field::is_unset")]` so
/// that `Unset` keys are omitted while `Null` encodes as JSON `null`. On
/// decode, an absent key yields `Unset` and an explicit `null` yields `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field<T> {
    Unset,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Unset => Field::Unset,
            Self::Null => Field::Null,
            Self::Value(v) => Field::Value(v),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Null,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_some(v),
            Self::Unset | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

// Lets scalar adapters compose: `#[serde_as(as = "Field<Seconds>")]`.
impl<T, U> SerializeAs<Field<T>> for Field<U>
where
    U: SerializeAs<T>,
{
    fn serialize_as<S: Serializer>(source: &Field<T>, serializer: S) -> Result<S::Ok, S::Error> {
        match source {
            Field::Value(v) => serializer.serialize_some(&SerializeAsWrap::<T, U>::new(v)),
            Field::Unset | Field::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T, U> DeserializeAs<'de, Field<T>> for Field<U>
where
    U: DeserializeAs<'de, T>,
{
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<Field<T>, D::Error> {
        let wrapped = Option::<DeserializeAsWrap<T, U>>::deserialize(deserializer)?;
        Ok(wrapped.map(DeserializeAsWrap::into_inner).into())
    }
}
