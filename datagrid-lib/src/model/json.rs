//! JSON conversion for values and rows

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Map;
use serde_json::Number;

use super::Row;
use super::User;
use super::Value;

impl Value {
    /// Converts a JSON value without any column information.
    ///
    /// Arrays of user objects become [`Value::Users`]; anything that is not a
    /// scalar or a user list is kept as [`Value::Json`].
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => number_to_value(n),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                match serde_json::from_value::<Vec<User>>(serde_json::Value::Array(items.clone())) {
                    Ok(users) => Value::Users(users),
                    Err(_) => Value::Json(json.clone()),
                }
            }
            serde_json::Value::Object(_) => Value::Json(json.clone()),
        }
    }

    /// Converts this value to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => decimal_to_json(*n),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Users(users) => serde_json::to_value(users).unwrap_or(serde_json::Value::Null),
            Value::Json(json) => json.clone(),
        }
    }
}

impl Row {
    /// Builds a row from a JSON object.
    pub fn from_json_object(object: &Map<String, serde_json::Value>) -> Row {
        let mut row = Row::new();
        for (key, value) in object {
            row.insert(key.clone(), Value::from_json(value));
        }
        row
    }

    /// Converts this row to a JSON object.
    pub fn to_json_object(&self) -> Map<String, serde_json::Value> {
        self.fields()
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Number(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Value::Number(Decimal::from(u));
    }
    n.as_f64()
        .and_then(Decimal::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn decimal_to_json(n: Decimal) -> serde_json::Value {
    if n.fract().is_zero() {
        if let Some(i) = n.to_i64() {
            return serde_json::Value::Number(i.into());
        }
    }
    n.to_f64()
        .and_then(Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(n.to_string()))
}
