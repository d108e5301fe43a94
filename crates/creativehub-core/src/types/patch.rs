//! Tri-state field update used by partial writes.
//!
//! A nullable column can be left alone, cleared, or overwritten. A plain
//! `Option<T>` cannot tell "left alone" from "cleared", so partial updates
//! carry a [`Patch`] per column instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A pending change to one nullable column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// The column keeps its stored value.
    #[default]
    Unchanged,
    /// The column is set to NULL.
    Clear,
    /// The column is set to the given value.
    Set(T),
}

impl<T> Patch<T> {
    /// Returns `true` if the column must be written (set or cleared).
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns `true` if the column keeps its stored value.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// The value to write, or `None` for both `Clear` and `Unchanged`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Applies the change to a stored nullable value.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Clear => *target = None,
            Self::Set(v) => *target = Some(v),
        }
    }
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(value: Option<Option<T>>) -> Self {
        match value {
            None => Self::Unchanged,
            Some(None) => Self::Clear,
            Some(Some(v)) => Self::Set(v),
        }
    }
}

/// Absent fields deserialize through `#[serde(default)]` to `Unchanged`;
/// an explicit `null` becomes `Clear`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Set(v),
            None => Self::Clear,
        })
    }
}

/// Pair with `#[serde(skip_serializing_if = "Patch::is_unchanged")]`.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(v) => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Update {
        #[serde(default)]
        error_code: Patch<String>,
    }

    #[test]
    fn test_absent_field_is_unchanged() {
        let update: Update = serde_json::from_str("{}").expect("parse");
        assert_eq!(update.error_code, Patch::Unchanged);
    }

    #[test]
    fn test_null_field_clears() {
        let update: Update = serde_json::from_str(r#"{"error_code":null}"#).expect("parse");
        assert_eq!(update.error_code, Patch::Clear);
    }

    #[test]
    fn test_value_field_sets() {
        let update: Update = serde_json::from_str(r#"{"error_code":"TIMEOUT"}"#).expect("parse");
        assert_eq!(update.error_code, Patch::Set("TIMEOUT".to_string()));
    }

    #[test]
    fn test_apply_to() {
        let mut stored = Some("old".to_string());
        Patch::Unchanged.apply_to(&mut stored);
        assert_eq!(stored.as_deref(), Some("old"));
        Patch::Set("new".to_string()).apply_to(&mut stored);
        assert_eq!(stored.as_deref(), Some("new"));
        Patch::Clear.apply_to(&mut stored);
        assert_eq!(stored, None);
    }
}
