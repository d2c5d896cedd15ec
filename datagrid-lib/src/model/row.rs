//! Dynamic grid row

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use super::User;
use super::Value;
use crate::error::FieldError;

/// Identity of a row, read from the schema's unique key field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Creates a row identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an identity from a cell value.
    ///
    /// Only text and numeric values can identify a row.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.normalize().to_string())),
            _ => None,
        }
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for RowId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<i32> for RowId {
    fn from(v: i32) -> Self {
        Self(v.to_string())
    }
}

/// One record of grid data.
///
/// Rows hold cell values as a `HashMap<String, Value>` keyed by column key.
/// A row used as an update payload holds only the changed keys.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::Row;
///
/// let row = Row::new()
///     .set("id", "p-1")
///     .set("plasmid", "pUC19")
///     .set("volume", 250i64);
///
/// assert_eq!(row.get_text("plasmid").unwrap(), Some("pUC19"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: HashMap<String, Value>,
}

impl Row {
    /// Creates a new empty row.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the row contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reads the row identity from the given unique key field.
    pub fn id(&self, unique_key: &str) -> Option<RowId> {
        self.get(unique_key).and_then(RowId::from_value)
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets a field value (builder style).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets a field value in place, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Overwrites this row's fields with every field of `partial`.
    pub fn apply(&mut self, partial: &Row) {
        for (key, value) in &partial.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Returns the fields of `self` whose values differ from `original`.
    ///
    /// A field missing from `original` counts as changed unless it is null.
    pub fn changes_from(&self, original: &Row) -> Row {
        let fields = self
            .fields
            .iter()
            .filter(|(key, value)| match original.get(key) {
                Some(before) => before != *value,
                None => !value.is_null(),
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Row { fields }
    }

    // =========================================================================
    // Typed getters
    // =========================================================================

    /// Returns the text value of a field.
    ///
    /// `Ok(None)` for a missing or null field, `Err` for another type.
    pub fn get_text(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s)),
            Some(other) => Err(FieldError::type_mismatch(field, "text", other.type_name())),
        }
    }

    /// Returns the numeric value of a field.
    pub fn get_number(&self, field: &str) -> Result<Option<Decimal>, FieldError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::type_mismatch(field, "number", other.type_name())),
        }
    }

    /// Returns the users assigned in a field.
    pub fn get_users(&self, field: &str) -> Result<&[User], FieldError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Users(users)) => Ok(users),
            Some(other) => Err(FieldError::type_mismatch(field, "users", other.type_name())),
        }
    }

    /// Returns the value of a field that must be present.
    pub fn require(&self, field: &str) -> Result<&Value, FieldError> {
        self.get(field).ok_or_else(|| FieldError::missing(field))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_from_number_and_text() {
        let row = Row::new().set("id", 5i64);
        assert_eq!(row.id("id"), Some(RowId::from(5)));

        let row = Row::new().set("id", "p-1");
        assert_eq!(row.id("id"), Some(RowId::from("p-1")));

        assert_eq!(Row::new().id("id"), None);
    }

    #[test]
    fn test_changes_from_only_returns_differences() {
        let original = Row::new().set("id", 1i64).set("plasmid", "A").set("volume", 10i64);
        let edited = original.clone().set("plasmid", "B");

        let changes = edited.changes_from(&original);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get_text("plasmid").unwrap(), Some("B"));
    }

    #[test]
    fn test_typed_getter_mismatch() {
        let row = Row::new().set("volume", 10i64);
        let err = row.get_text("volume").unwrap_err();
        assert!(matches!(err, FieldError::TypeMismatch { .. }));
        assert!(row.require("missing").is_err());
    }
}
