//! Value enum for dynamic cell values

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use super::User;

/// A dynamic value held by one cell of a [`Row`](super::Row).
///
/// The variant a column holds is decided by its declared
/// [`ColumnKind`](super::ColumnKind), not by inspecting the value:
///
/// | Column kind | Variant |
/// |-------------|---------|
/// | `text`, `link`, `tag` | `Text` |
/// | `number` | `Number` |
/// | `user` | `Users` |
///
/// `Null` stands for an empty cell, `Json` keeps values the schema does not
/// describe so they survive a round trip.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::Value;
///
/// let name = Value::from("pUC19");
/// let volume = Value::from(250i64);
/// let empty = Value::Null;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/empty value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Decimal),
    /// String value.
    Text(String),
    /// Assigned users.
    Users(Vec<User>),
    /// Fallback for unrecognized JSON values.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Users(_) => "users",
            Value::Json(_) => "json",
        }
    }

    /// Returns the string slice if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a numeric value.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the users if this is a user list.
    pub fn as_users(&self) -> Option<&[User]> {
        match self {
            Value::Users(users) => Some(users),
            _ => None,
        }
    }

    /// Name of the first assigned user, or `""` when there is none.
    ///
    /// User columns sort on this key rather than on the whole list.
    pub fn first_user_name(&self) -> &str {
        match self {
            Value::Users(users) => users.first().map(|u| u.name.as_str()).unwrap_or(""),
            _ => "",
        }
    }

    /// Plain-text form used for searching and simple display.
    pub fn display_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.normalize().to_string(),
            Value::Text(s) => s.clone(),
            Value::Users(users) => users
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Json(json) => json.to_string(),
        }
    }

    /// Total order used by client-side sorting.
    ///
    /// Values of the same variant compare naturally; mixed variants order as
    /// null < bool < number < text < users < json.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Users(_), Value::Users(_)) => self.first_user_name().cmp(other.first_user_name()),
            (Value::Json(a), Value::Json(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Users(_) => 4,
            Value::Json(_) => 5,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(Decimal::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Decimal::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Decimal::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<User>> for Value {
    fn from(v: Vec<User>) -> Self {
        Value::Users(v)
    }
}

impl From<User> for Value {
    fn from(v: User) -> Self {
        Value::Users(vec![v])
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
