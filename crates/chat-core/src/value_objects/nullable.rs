//! Tri-state optional for PATCH-style payloads
//!
//! Distinguishes "leave the field alone" from "clear the field":
//!
//! ```
//! use chat_core::Nullable;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct EditChannel {
//!     #[serde(skip_serializing_if = "Nullable::is_absent")]
//!     topic: Nullable<String>,
//!     #[serde(skip_serializing_if = "Nullable::is_absent")]
//!     parent_id: Nullable<u64>,
//! }
//!
//! let body = EditChannel { topic: Nullable::Value("news".into()), parent_id: Nullable::Null };
//! assert_eq!(
//!     serde_json::to_string(&body).unwrap(),
//!     r#"{"topic":"news","parent_id":null}"#
//! );
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that may be absent, explicitly null, or set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    /// Not provided; omitted from the payload
    Absent,
    /// Provided as an explicit `null`
    Null,
    /// Provided with a value
    Value(T),
}

impl<T> Nullable<T> {
    /// True when the field should be omitted
    #[inline]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True when the field is explicitly null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value if one is set
    pub const fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Map the inner value, keeping the absent/null distinction
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Nullable<U> {
        match self {
            Self::Absent => Nullable::Absent,
            Self::Null => Nullable::Null,
            Self::Value(v) => Nullable::Value(f(v)),
        }
    }

    /// Collapse into `Option<Option<T>>` (outer `None` = absent)
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    /// `Some(v)` sets the value, `None` becomes an explicit null
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Null,
        }
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Absent | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    /// A present key deserializes to `Null` or `Value`; pair with
    /// `#[serde(default)]` so a missing key yields `Absent`.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}
