//! Partial-update field type.
//!
//! Update payloads sent to the document store are merge-patches: keys
//! present in the body are written, a JSON `null` clears a field, and
//! absent keys are left untouched. [`Patch`] makes that three-way
//! distinction explicit in the type system so an update struct can never
//! accidentally overwrite a field with a missing value.
//!
//! Pair every `Patch` field with
//! `#[serde(default, skip_serializing_if = "Patch::is_keep")]`:
//!
//! ```
//! use rallypoint_core::Patch;
//! use serde::Serialize;
//!
//! #[derive(Serialize, Default)]
//! struct ClubPatch {
//!     #[serde(default, skip_serializing_if = "Patch::is_keep")]
//!     name: Patch<String>,
//!     #[serde(default, skip_serializing_if = "Patch::is_keep")]
//!     description: Patch<String>,
//! }
//!
//! let patch = ClubPatch {
//!     name: Patch::Set("Trail Runners".into()),
//!     description: Patch::Clear,
//! };
//! let json = serde_json::to_string(&patch).unwrap();
//! assert_eq!(json, r#"{"name":"Trail Runners","description":null}"#);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single field of a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Leave the stored value untouched (absent from the wire).
    #[default]
    Keep,
    /// Write a new value.
    Set(T),
    /// Clear the stored value (JSON `null` on the wire).
    Clear,
}

impl<T> Patch<T> {
    /// Whether this field should be omitted from the wire entirely.
    ///
    /// Used as a `skip_serializing_if` predicate.
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Whether this field writes a new value.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Borrow the value being set, if any.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            Self::Keep | Self::Clear => None,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `Some` sets the value; `None` clears it. There is deliberately no
    /// conversion that produces `Keep` - untouched fields must be untouched
    /// by construction, not by a sentinel.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(v) => v.serialize(serializer),
            // Keep must be filtered out by skip_serializing_if; if it does
            // reach the serializer, null (a no-op merge for most fields) is
            // still safer than inventing a value.
            Self::Keep | Self::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<T>::deserialize(deserializer)?;
        Ok(value.map_or(Self::Clear, Self::Set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Default)]
    struct TestPatch {
        #[serde(default, skip_serializing_if = "Patch::is_keep")]
        name: Patch<String>,
        #[serde(default, skip_serializing_if = "Patch::is_keep")]
        count: Patch<u32>,
    }

    #[test]
    fn test_keep_is_absent() {
        let patch = TestPatch::default();
        let json = serde_json::to_string(&patch).expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_set_and_clear() {
        let patch = TestPatch {
            name: Patch::Clear,
            count: Patch::Set(3),
        };
        let json = serde_json::to_string(&patch).expect("serialize");
        assert_eq!(json, r#"{"name":null,"count":3}"#);
    }

    #[test]
    fn test_absent_deserializes_to_keep() {
        let patch: TestPatch = serde_json::from_str("{}").expect("deserialize");
        assert!(patch.name.is_keep());
        assert!(patch.count.is_keep());
    }

    #[test]
    fn test_null_deserializes_to_clear() {
        let patch: TestPatch = serde_json::from_str(r#"{"name":null}"#).expect("deserialize");
        assert_eq!(patch.name, Patch::Clear);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Patch::from(Some(1)), Patch::Set(1));
        assert_eq!(Patch::<i32>::from(None), Patch::Clear);
    }
}
